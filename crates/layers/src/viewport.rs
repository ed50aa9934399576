use foundation::{Corners, LngLatBounds};
use model::{Feature, Shape, prepare};
use render::{FitOptions, MapRenderer};
use tracing::debug;

/// Box covering every validated shape.
pub fn bounds_of_shapes<'a, I>(shapes: I) -> LngLatBounds
where
    I: IntoIterator<Item = &'a Shape>,
{
    let mut bounds = LngLatBounds::empty();
    for shape in shapes {
        bounds.extend_all(shape.extent_positions().iter().copied());
    }
    bounds
}

/// Box covering every feature whose geometry survives validation.
///
/// Points contribute their position, lines every vertex, polygons their
/// outer ring.
pub fn bounds_of_features(features: &[Feature]) -> LngLatBounds {
    let shapes: Vec<Shape> = features
        .iter()
        .filter_map(|f| prepare(f.geometry.as_ref()).ok())
        .map(|valid| valid.shape)
        .collect();
    bounds_of_shapes(&shapes)
}

/// Moves the camera onto `bounds`. An empty box leaves the camera alone.
///
/// Returns the corners the camera was asked to show.
pub fn fit<R>(renderer: &mut R, bounds: &LngLatBounds, options: FitOptions) -> Option<Corners>
where
    R: MapRenderer + ?Sized,
{
    let Some(corners) = bounds.corners() else {
        debug!("nothing to fit; camera unchanged");
        return None;
    };
    renderer.fit_bounds(corners, options);
    Some(corners)
}

#[cfg(test)]
mod tests {
    use super::{bounds_of_features, fit};
    use foundation::{LngLat, LngLatBounds};
    use model::{Feature, Geometry, GeometryKind};
    use render::{FitOptions, MemoryRenderer};
    use serde_json::json;

    #[test]
    fn point_and_polygon_share_one_box() {
        let features = vec![
            Feature::new("station", Geometry::point(-97.74, 30.27)),
            Feature::new(
                "zip",
                Geometry::new(
                    GeometryKind::Polygon,
                    json!([[[-98, 30], [-97, 30], [-97, 31], [-98, 31]]]),
                ),
            ),
        ];
        let b = bounds_of_features(&features);
        assert_eq!(b.south_west(), Some(LngLat::new(-98.0, 30.0)));
        assert_eq!(b.north_east(), Some(LngLat::new(-97.0, 31.0)));
    }

    #[test]
    fn polygon_holes_do_not_widen_the_box() {
        let features = vec![Feature::new(
            "zip",
            Geometry::new(
                GeometryKind::Polygon,
                json!([
                    [[0, 0], [1, 0], [1, 1], [0, 1]],
                    [[50, 50], [51, 50], [51, 51]]
                ]),
            ),
        )];
        let b = bounds_of_features(&features);
        assert_eq!(b.north_east(), Some(LngLat::new(1.0, 1.0)));
    }

    #[test]
    fn line_contributes_every_vertex() {
        let features = vec![Feature::new(
            "route",
            Geometry::new(
                GeometryKind::LineString,
                json!([[-97.7, 30.2], [-96.8, 32.8], [-95.4, 29.8]]),
            ),
        )];
        let b = bounds_of_features(&features);
        assert_eq!(b.south_west(), Some(LngLat::new(-97.7, 29.8)));
        assert_eq!(b.north_east(), Some(LngLat::new(-95.4, 32.8)));
    }

    #[test]
    fn invalid_features_are_ignored() {
        let features = vec![
            Feature::default(),
            Feature::new("empty", Geometry::new(GeometryKind::Polygon, json!([]))),
        ];
        assert!(bounds_of_features(&features).is_empty());
    }

    #[test]
    fn empty_box_leaves_camera_alone() {
        let mut r = MemoryRenderer::new();
        assert_eq!(
            fit(&mut r, &LngLatBounds::empty(), FitOptions::default()),
            None
        );
        assert!(r.camera_moves().is_empty());
    }
}
