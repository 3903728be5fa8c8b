use crate::domain::model::{Branch, Headquarter, ImportRecord};
use crate::domain::swift_code::SwiftCode;
use std::collections::{BTreeMap, HashMap};

/// Result of assembling flat import rows into headquarter documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutcome {
    /// Assembled documents keyed by the 8 character prefix.
    pub headquarters: BTreeMap<String, Headquarter>,
    /// Headquarter rows that were replaced by a later row with the same prefix.
    pub replaced_headquarters: Vec<SwiftCode>,
    /// Branch rows that were replaced by a later row with the same code.
    pub replaced_branches: Vec<SwiftCode>,
    /// Branch rows whose prefix had no headquarter; not present in `headquarters`.
    pub orphan_branches: Vec<SwiftCode>,
}

impl TransformOutcome {
    pub fn branch_count(&self) -> usize {
        self.headquarters.values().map(|hq| hq.branches.len()).sum()
    }

    pub fn has_anomalies(&self) -> bool {
        !self.replaced_headquarters.is_empty()
            || !self.replaced_branches.is_empty()
            || !self.orphan_branches.is_empty()
    }

    pub fn into_documents(self) -> Vec<Headquarter> {
        self.headquarters.into_values().collect()
    }
}

/// Groups headquarter and branch rows by prefix, then attaches branches to their headquarter.
///
/// Row order only matters within a prefix: branches keep their input order. A later headquarter
/// row for an already seen prefix replaces the earlier one and is reported in
/// `replaced_headquarters`. A repeated branch code keeps its first position but takes the later
/// row's values, and is reported in `replaced_branches`. Branches without a headquarter are
/// reported in `orphan_branches`.
pub fn transform(records: Vec<ImportRecord>) -> TransformOutcome {
    let mut headquarters: BTreeMap<String, Headquarter> = BTreeMap::new();
    let mut branches: HashMap<String, Vec<Branch>> = HashMap::new();
    let mut replaced_headquarters = Vec::new();
    let mut replaced_branches = Vec::new();

    // 第一輪：分類
    for record in records {
        let prefix = record.swift_code.parent_prefix().to_string();

        if record.swift_code.is_headquarter() {
            let hq = record.into_headquarter();
            if let Some(previous) = headquarters.insert(prefix, hq) {
                tracing::warn!(
                    "Duplicate headquarter prefix {}: replacing {}",
                    previous.swift_code.parent_prefix(),
                    previous.swift_code
                );
                replaced_headquarters.push(previous.swift_code);
            }
        } else {
            let branch = record.into_branch();
            let siblings = branches.entry(prefix).or_default();
            match siblings.iter_mut().find(|b| b.swift_code == branch.swift_code) {
                Some(existing) => {
                    tracing::warn!("Duplicate branch {}: keeping the later row", branch.swift_code);
                    replaced_branches.push(branch.swift_code.clone());
                    *existing = branch;
                }
                None => siblings.push(branch),
            }
        }
    }

    // 第二輪：合併分行
    for (prefix, hq) in headquarters.iter_mut() {
        if let Some(found) = branches.remove(prefix) {
            hq.branches.extend(found);
        }
    }

    let mut orphan_branches: Vec<SwiftCode> = branches
        .into_values()
        .flatten()
        .map(|b| b.swift_code)
        .collect();
    orphan_branches.sort();

    if !orphan_branches.is_empty() {
        tracing::warn!(
            "Dropping {} branch(es) without a headquarter: {:?}",
            orphan_branches.len(),
            orphan_branches.iter().map(SwiftCode::as_str).collect::<Vec<_>>()
        );
    }

    TransformOutcome {
        headquarters,
        replaced_headquarters,
        replaced_branches,
        orphan_branches,
    }
}
