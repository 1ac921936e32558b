use cellscope_primitives::{Highlight, Palette};

use crate::classify::FlowReport;

/// Turn a flow report into fills, partition first and overlay after, so the
/// host applying them in order ends with the overlay color on shared cells.
pub fn highlight_plan(report: &FlowReport, palette: &Palette) -> Vec<Highlight> {
    let overlay_groups = report
        .overlay
        .iter()
        .flat_map(|overlay| overlay.groups());
    report
        .classification
        .groups()
        .into_iter()
        .chain(overlay_groups)
        .flat_map(|(category, group)| {
            group
                .iter()
                .map(move |address| Highlight::new(address, category, palette))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Classification, FlowOverlay};
    use cellscope_primitives::HighlightCategory;

    #[test]
    fn test_plan_orders_partition_before_overlay() {
        let mut classification = Classification::default();
        classification.inputs.insert("S!A2");
        classification.outputs.insert("S!A3");
        let mut overlay = FlowOverlay::default();
        overlay.inflows.insert("S!A3");
        let report = FlowReport {
            classification,
            overlay: Some(overlay),
            diagnostics: Vec::new(),
        };

        let palette = Palette::default();
        let plan = highlight_plan(&report, &palette);
        let categories: Vec<_> = plan.iter().map(|h| (h.address.as_str(), h.category)).collect();
        assert_eq!(
            categories,
            vec![
                ("S!A2", HighlightCategory::Input),
                ("S!A3", HighlightCategory::Output),
                ("S!A3", HighlightCategory::Inflow),
            ]
        );
        assert_eq!(plan[0].color, palette.color(HighlightCategory::Input));
    }
}
