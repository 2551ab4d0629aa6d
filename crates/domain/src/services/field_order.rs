//! Field label ordering for export columns.
//!
//! Exports carry a dynamic set of question labels discovered in the
//! job's data. Known survey questions get a fixed position so repeated
//! runs over identical data produce identically-shaped tables; labels
//! from custom forms sort after, in discovery order.

/// Known survey-question labels, in export column order.
const PRIORITY_LABELS: &[&str] = &[
    "De façon générale, comment ça s'est passé ?",
    "Était-ce facile à utiliser ?",
    "Qu'avez-vous pensé des informations et des instructions fournies ?",
    "Avez-vous rencontré des difficultés ?",
    "Quelles ont été ces difficultés ?",
    "De quelle aide avez-vous eu besoin ?",
    "Quelle a été cette aide ?",
    "Avez-vous tenté de contacter le service d'aide ?",
    "Avez-vous réussi à joindre le service d'aide ?",
    "Par quel(s) moyen(s) avez-vous tenté de contacter le service ?",
    "Comment s'est passé l'échange avec le service d'aide ?",
    "Souhaitez-vous nous en dire plus ?",
];

/// Orders discovered labels deterministically: priority labels first in
/// list order, unknown labels after in their discovery order.
///
/// The input carries discovery order; duplicates are dropped, first
/// occurrence wins.
pub fn order_labels<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: Vec<String> = Vec::new();
    for label in labels {
        let label = label.as_ref();
        if !seen.iter().any(|s| s == label) {
            seen.push(label.to_string());
        }
    }

    seen.sort_by_key(|label| {
        PRIORITY_LABELS
            .iter()
            .position(|known| known == label)
            .unwrap_or(usize::MAX)
    });
    // sort_by_key is stable, so unknown labels keep discovery order
    seen
}
