//! Provider route normalization.
//!
//! Flattens a raw provider route into the [`Route`] model: decodes flat
//! vertex lists into polylines, maps guidance codes to maneuvers, and
//! synthesizes a guidance step for sections the provider sent bare.
//! Walking duration is recomputed here, at normalization time, because the
//! provider's driving-tuned durations underestimate walking time.

use crate::directions::types::{RawRoute, RawSection};
use crate::geo::GeoPoint;
use crate::route::model::{GuidanceStep, ManeuverKind, Route, RouteError, RouteSection};

/// Normalize a raw provider route into the indexable [`Route`] model.
///
/// `destination` anchors the synthesized arrival step when the final
/// section carries no guides and no usable geometry.
pub fn normalize(raw: &RawRoute, destination: GeoPoint) -> Result<Route, RouteError> {
    let section_count = raw.sections.len();
    let mut sections = Vec::with_capacity(section_count);

    for (index, raw_section) in raw.sections.iter().enumerate() {
        let polyline: Vec<GeoPoint> = raw_section
            .roads
            .iter()
            .flat_map(|road| road.points())
            .collect();

        let mut guides: Vec<GuidanceStep> = raw_section
            .guides
            .iter()
            .map(|guide| GuidanceStep {
                // densely re-assigned by Route::from_sections
                sequence_index: 0,
                section_index: index,
                anchor: GeoPoint::new(guide.y, guide.x),
                distance_meters: guide.distance,
                kind: ManeuverKind::from_guidance_code(guide.guidance_type),
                raw_text: guide.guidance_text.clone(),
            })
            .collect();

        if guides.is_empty() {
            guides.push(synthesize_step(
                raw_section,
                index,
                section_count,
                raw.sections.get(index + 1),
                destination,
            ));
        }

        sections.push(RouteSection {
            distance_meters: raw_section.distance,
            guides,
            polyline,
        });
    }

    Route::from_sections(raw.summary.distance, sections)
}

/// Build the single step a guide-less section gets: an arrival step for
/// the final section, otherwise straight-ahead anchored at the start of
/// the next section.
fn synthesize_step(
    section: &RawSection,
    index: usize,
    section_count: usize,
    next_section: Option<&RawSection>,
    destination: GeoPoint,
) -> GuidanceStep {
    let is_last = index + 1 == section_count;
    let anchor = if is_last {
        destination
    } else {
        next_section
            .and_then(|next| next.first_vertex())
            .unwrap_or(destination)
    };

    GuidanceStep {
        sequence_index: 0,
        section_index: index,
        anchor,
        distance_meters: section.distance,
        kind: if is_last {
            ManeuverKind::Arrive
        } else {
            ManeuverKind::Straight
        },
        raw_text: None,
    }
}
