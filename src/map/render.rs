use std::sync::Arc;

use tracing::{debug, info};

use super::engine::{
    CircleMarkerSpec, Directions, GeoBounds, LabelSpec, MapError, MapInstance, Overlay,
    PolylineSpec, RouteStyle,
};
use crate::api::{LonLat, RoutePayload, RoutePoint, RouteSegment, RouteType};

/// Visual constants for route overlays.
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub route_line_width: f32,
    pub casing_width: f32,
    pub casing_color: String,
    pub fallback_route_color: String,
    pub marker_radius: f32,
    pub marker_color: String,
    pub marker_stroke_width: f32,
    pub marker_stroke_color: String,
    pub label_font_size: f32,
    pub label_color: String,
    pub fit_padding: u32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            route_line_width: 5.0,
            casing_width: 9.0,
            casing_color: "#ffffff".to_string(),
            fallback_route_color: "#0088ff".to_string(),
            marker_radius: 16.0,
            marker_color: "#0088ff".to_string(),
            marker_stroke_width: 2.0,
            marker_stroke_color: "#ffffff".to_string(),
            label_font_size: 14.0,
            label_color: "#ffffff".to_string(),
            fit_padding: 64,
        }
    }
}

/// Reconciliation engine for route overlays.
///
/// Re-run whenever the map handle or the route payload changes. Full
/// replace, no diffing: the owned overlay set is destroyed before any new
/// object is created, so the visible overlays always correspond to the
/// latest payload and peak overlay count stays bounded.
pub struct RouteRenderer {
    style: RenderStyle,
    directions_api_key: String,
    directions: Option<Box<dyn Directions>>,
    bound_map: Option<Arc<dyn MapInstance>>,
    owned: Vec<Box<dyn Overlay>>,
}

impl RouteRenderer {
    pub fn new(directions_api_key: impl Into<String>) -> Self {
        Self::with_style(directions_api_key, RenderStyle::default())
    }

    pub fn with_style(directions_api_key: impl Into<String>, style: RenderStyle) -> Self {
        Self {
            style,
            directions_api_key: directions_api_key.into(),
            directions: None,
            bound_map: None,
            owned: Vec::new(),
        }
    }

    /// Number of overlay objects currently owned.
    pub fn overlay_count(&self) -> usize {
        self.owned.len()
    }

    /// Destroy every owned overlay and clear the directions helper.
    /// Idempotent: clearing an empty set is a no-op.
    pub fn clear(&mut self) {
        if let Some(directions) = self.directions.as_mut() {
            directions.clear();
        }
        for overlay in self.owned.drain(..) {
            overlay.destroy();
        }
    }

    /// Reconcile the overlays with the given handle/payload pair.
    ///
    /// Stale overlays are destroyed first, unconditionally. Nothing is
    /// drawn without a handle, without a payload, or for routes shorter
    /// than two points; the map view is left untouched in those cases.
    pub fn render(
        &mut self,
        map: Option<&Arc<dyn MapInstance>>,
        payload: Option<&RoutePayload>,
    ) -> Result<(), MapError> {
        self.clear();

        let Some(map) = map else {
            self.directions = None;
            self.bound_map = None;
            return Ok(());
        };

        // The directions helper is bound to one map instance; construct it
        // lazily and rebuild it when the surface remounts.
        let same_map = self
            .bound_map
            .as_ref()
            .is_some_and(|bound| Arc::ptr_eq(bound, map));
        if !same_map {
            self.directions = map.directions(&self.directions_api_key);
            self.bound_map = Some(Arc::clone(map));
        }

        let Some(payload) = payload else {
            return Ok(());
        };

        match payload {
            RoutePayload::Error { error } => {
                info!("No route to draw: {}", error);
                Ok(())
            }
            RoutePayload::SinglePath {
                route_type,
                route,
                pivot_route_points,
                ..
            } => self.render_single_path(map, *route_type, route, pivot_route_points),
            RoutePayload::Segmented { route, .. } => self.render_segments(map, route),
        }
    }

    fn render_single_path(
        &mut self,
        map: &Arc<dyn MapInstance>,
        route_type: RouteType,
        route: &[RoutePoint],
        pivot_route_points: &[RoutePoint],
    ) -> Result<(), MapError> {
        if let Some(directions) = self.directions.as_mut() {
            let points: Vec<LonLat> = pivot_route_points.iter().map(|p| p.coord).collect();
            if points.len() < 2 {
                return Ok(());
            }
            let style = RouteStyle {
                route_line_width: self.style.route_line_width,
            };
            debug!("Drawing {:?} route through {} waypoints", route_type, points.len());
            match route_type {
                RouteType::Pedestrian => directions.pedestrian_route(&points, &style),
                RouteType::Other => directions.car_route(&points, &style),
            }
        } else {
            self.render_whole_path(map, route, pivot_route_points)
        }
    }

    /// Whole-route fallback when no directions helper is available: one
    /// polyline over the full geometry, endpoint markers labeled "A" and
    /// "B", viewport fit to the route bounds.
    fn render_whole_path(
        &mut self,
        map: &Arc<dyn MapInstance>,
        route: &[RoutePoint],
        pivot_route_points: &[RoutePoint],
    ) -> Result<(), MapError> {
        let source = if route.len() >= 2 {
            route
        } else {
            pivot_route_points
        };
        let coordinates: Vec<LonLat> = source.iter().map(|p| p.coord).collect();
        if coordinates.len() < 2 {
            return Ok(());
        }

        self.owned.push(map.add_polyline(&PolylineSpec {
            coordinates: coordinates.clone(),
            width: self.style.route_line_width,
            color: self.style.fallback_route_color.clone(),
            width2: self.style.casing_width,
            color2: self.style.casing_color.clone(),
            z_index: 0,
        })?);

        let endpoints = [
            (coordinates[0], "A"),
            (coordinates[coordinates.len() - 1], "B"),
        ];
        for (coord, text) in endpoints {
            self.owned.push(map.add_circle_marker(&CircleMarkerSpec {
                coordinates: coord,
                radius: self.style.marker_radius,
                color: self.style.marker_color.clone(),
                stroke_width: self.style.marker_stroke_width,
                stroke_color: self.style.marker_stroke_color.clone(),
                z_index: 1,
            })?);
            self.owned.push(map.add_label(&LabelSpec {
                coordinates: coord,
                text: text.to_string(),
                font_size: self.style.label_font_size,
                color: self.style.label_color.clone(),
                z_index: 2,
            })?);
        }

        if let Some(bounds) = GeoBounds::enclosing(&coordinates) {
            map.fit_bounds(bounds, self.style.fit_padding);
        }

        Ok(())
    }

    fn render_segments(
        &mut self,
        map: &Arc<dyn MapInstance>,
        segments: &[RouteSegment],
    ) -> Result<(), MapError> {
        let total_points: usize = segments.iter().map(|s| s.coords.len()).sum();
        if total_points < 2 {
            return Ok(());
        }

        let count = segments.len();
        for (i, segment) in segments.iter().enumerate() {
            // Descending z-order: earlier segments render above later ones.
            let z_index = (count - 1 - i) as i32;
            self.owned.push(map.add_polyline(&PolylineSpec {
                coordinates: segment.coords.clone(),
                width: self.style.route_line_width,
                color: segment.color.clone(),
                width2: self.style.casing_width,
                color2: self.style.casing_color.clone(),
                z_index,
            })?);

            let Some(label) = &segment.label else {
                continue;
            };
            // Anchor at the first point for the first segment, at the last
            // point otherwise. Start-of-route annotations get higher z so
            // they are never occluded.
            let is_first = i == 0;
            let anchor = if is_first {
                segment.coords.first()
            } else {
                segment.coords.last()
            };
            let Some(&anchor) = anchor else {
                continue;
            };

            self.owned.push(map.add_circle_marker(&CircleMarkerSpec {
                coordinates: anchor,
                radius: self.style.marker_radius,
                color: self.style.marker_color.clone(),
                stroke_width: self.style.marker_stroke_width,
                stroke_color: self.style.marker_stroke_color.clone(),
                z_index: if is_first { 5 } else { 3 },
            })?);
            self.owned.push(map.add_label(&LabelSpec {
                coordinates: anchor,
                text: label.clone(),
                font_size: self.style.label_font_size,
                color: self.style.label_color.clone(),
                z_index: if is_first { 6 } else { 4 },
            })?);
        }

        Ok(())
    }
}
