use foundation::LngLat;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointerEventKind {
    Enter,
    Leave,
    Click,
}

impl PointerEventKind {
    /// Event name understood by the map library.
    pub fn as_str(&self) -> &'static str {
        match self {
            PointerEventKind::Enter => "mouseenter",
            PointerEventKind::Leave => "mouseleave",
            PointerEventKind::Click => "click",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub layer_id: String,
    /// Map coordinate under the pointer.
    pub lng_lat: LngLat,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

impl Cursor {
    /// CSS `cursor` value; the default cursor clears the override.
    pub fn css(&self) -> &'static str {
        match self {
            Cursor::Default => "",
            Cursor::Pointer => "pointer",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PopupContent {
    pub title: Option<String>,
    pub rows: Vec<(String, String)>,
}

impl PopupContent {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.rows.is_empty()
    }

    /// Plain-text rendering: the title line, then one `label: value` per row.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        if let Some(title) = &self.title {
            lines.push(title.clone());
        }
        for (label, value) in &self.rows {
            lines.push(format!("{label}: {value}"));
        }
        lines.join("\n")
    }

    /// HTML rendering with every piece of feature text escaped.
    pub fn to_html(&self) -> String {
        let mut out = String::from(r#"<div style="color: black; padding: 8px;">"#);
        if let Some(title) = &self.title {
            out.push_str(r#"<h3 style="font-weight: bold; margin-bottom: 8px;">"#);
            out.push_str(&escape_html(title));
            out.push_str("</h3>");
        }
        let rows: Vec<String> = self
            .rows
            .iter()
            .map(|(label, value)| {
                format!(
                    "<strong>{}:</strong> {}",
                    escape_html(label),
                    escape_html(value)
                )
            })
            .collect();
        out.push_str(&rows.join("<br/>"));
        out.push_str("</div>");
        out
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Transient overlay anchored on the map. At most one is visible.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub anchor: LngLat,
    pub content: PopupContent,
}

/// What a handler asks the renderer to do in response to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    SetCursor(Cursor),
    ShowPopup(Popup),
    ClosePopup,
}

/// Event callback bound to one layer. Dropped together with its layer.
pub type Handler = Box<dyn Fn(&PointerEvent) -> Option<Reaction>>;
