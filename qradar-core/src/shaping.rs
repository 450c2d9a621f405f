//! Post-fetch filtering and result shaping

use crate::entity::ShapedData;
use crate::offense::Offense;
use crate::options::Options;

fn keep(offense: &Offense, options: &Options) -> bool {
    if options.open_only && !offense.is_open() {
        return false;
    }
    match options.minimum_severity {
        Some(min) => offense.severity >= min,
        None => true,
    }
}

fn summary_tags(details: &[Offense]) -> Vec<String> {
    let mut tags = vec![format!("Offenses: {}", details.len())];
    if let Some(max) = details.iter().map(|o| o.severity).max() {
        tags.push(format!("Max Severity: {}", max));
    }
    let open = details.iter().filter(|o| o.is_open()).count();
    if open > 0 {
        tags.push(format!("Open: {}", open));
    }
    tags
}

/// Filter `offenses` by the open-only and minimum-severity options and shape
/// what survives. Returns `None` when there is nothing to show.
pub fn shape(offenses: &[Offense], options: &Options) -> Option<ShapedData> {
    let details: Vec<Offense> = offenses
        .iter()
        .filter(|o| keep(o, options))
        .cloned()
        .collect();

    if details.is_empty() {
        return None;
    }

    Some(ShapedData {
        summary: summary_tags(&details),
        details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offense::OffenseStatus;

    fn offense(id: u64, status: OffenseStatus, severity: u32) -> Offense {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "status": status.to_string(),
            "severity": severity,
        }))
        .unwrap()
    }

    fn opts() -> Options {
        Options::new("https://q", "u", "p")
    }

    #[test]
    fn empty_input_is_none() {
        assert!(shape(&[], &opts()).is_none());
    }

    #[test]
    fn no_filters_keeps_order() {
        let input = vec![
            offense(3, OffenseStatus::Closed, 2),
            offense(1, OffenseStatus::Open, 9),
            offense(2, OffenseStatus::Hidden, 5),
        ];
        let shaped = shape(&input, &opts()).unwrap();
        let ids: Vec<u64> = shaped.details.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn filters_are_conjunctive() {
        let input = vec![
            offense(1, OffenseStatus::Open, 9),
            offense(2, OffenseStatus::Open, 2),
            offense(3, OffenseStatus::Closed, 9),
        ];
        let mut o = opts();
        o.open_only = true;
        o.minimum_severity = Some(5);
        let shaped = shape(&input, &o).unwrap();
        assert_eq!(shaped.details.len(), 1);
        assert_eq!(shaped.details[0].id, 1);
    }

    #[test]
    fn severity_threshold_is_inclusive() {
        let input = vec![offense(1, OffenseStatus::Open, 6)];
        let mut o = opts();
        o.minimum_severity = Some(6);
        assert!(shape(&input, &o).is_some());
        o.minimum_severity = Some(7);
        assert!(shape(&input, &o).is_none());
    }

    #[test]
    fn summary_tags_describe_survivors() {
        let input = vec![
            offense(1, OffenseStatus::Open, 4),
            offense(2, OffenseStatus::Closed, 8),
        ];
        let shaped = shape(&input, &opts()).unwrap();
        assert_eq!(
            shaped.summary,
            vec!["Offenses: 2", "Max Severity: 8", "Open: 1"]
        );
    }

    #[test]
    fn summary_omits_open_tag_when_none_open() {
        let input = vec![offense(1, OffenseStatus::Closed, 4)];
        let shaped = shape(&input, &opts()).unwrap();
        assert_eq!(shaped.summary, vec!["Offenses: 1", "Max Severity: 4"]);
    }
}
