//! Frequency aggregation: fold per-occurrence candidates into one candidate
//! per surface form and drop forms seen fewer than `min_frequency` times.

use std::collections::HashMap;

use glossa_core::CandidateTerm;

/// Merge candidates case-insensitively and keep those occurring at least
/// `min_frequency` times. A threshold of 0 behaves like 1.
pub fn aggregate(candidates: Vec<CandidateTerm>, min_frequency: usize) -> Vec<CandidateTerm> {
    aggregate_with_rejects(candidates, min_frequency).0
}

/// Like [`aggregate`], also returning the merged forms that fell below the
/// threshold. Both lists are in order of first occurrence.
pub fn aggregate_with_rejects(
    candidates: Vec<CandidateTerm>,
    min_frequency: usize,
) -> (Vec<CandidateTerm>, Vec<CandidateTerm>) {
    let threshold = min_frequency.max(1);

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for candidate in candidates {
        let key = candidate.text.to_lowercase();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Group::default());
            groups.len() - 1
        });
        groups[slot].absorb(candidate);
    }

    let mut merged: Vec<CandidateTerm> = groups.into_iter().filter_map(Group::finish).collect();
    merged.sort_by_key(|c| c.first_offset());

    let (kept, below): (Vec<_>, Vec<_>) = merged.into_iter().partition(|c| c.count() >= threshold);
    tracing::debug!(
        stage = "frequency",
        kept = kept.len(),
        below = below.len(),
        threshold,
        "aggregated candidates"
    );
    (kept, below)
}

/// All occurrences sharing one lowercase key.
#[derive(Default)]
struct Group {
    /// Surface casing → (count, earliest offset).
    casings: Vec<(String, usize, usize)>,
    first: Option<CandidateTerm>,
    occurrences: Vec<glossa_core::Occurrence>,
}

impl Group {
    fn absorb(&mut self, candidate: CandidateTerm) {
        let offset = candidate.first_offset();
        let weight = candidate.count();
        match self.casings.iter_mut().find(|(text, ..)| *text == candidate.text) {
            Some((_, count, earliest)) => {
                *count += weight;
                *earliest = (*earliest).min(offset);
            }
            None => self.casings.push((candidate.text.clone(), weight, offset)),
        }

        self.occurrences.extend(candidate.occurrences.iter().copied());
        if self.first.is_none() {
            self.first = Some(candidate);
        }
    }

    fn finish(self) -> Option<CandidateTerm> {
        let mut first = self.first?;

        // Most frequent casing, ties to the one seen first.
        let canonical = self
            .casings
            .iter()
            .min_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)))
            .map(|(text, ..)| text.clone())?;

        let mut occurrences = self.occurrences;
        occurrences.sort_by_key(|o| (o.span.start, o.span.end, o.page));
        occurrences.dedup();

        first.text = canonical;
        first.occurrences = occurrences;
        Some(first)
    }
}
