use super::markers::MarkerSet;

/// Relabel marker lines from one vocabulary to another.
///
/// Lines that are markers under `from` are replaced with the matching
/// literal from `to`; everything else passes through. A trailing `\r` on a
/// relabeled line is kept.
pub fn migrate<S: AsRef<str>>(lines: &[S], from: &MarkerSet, to: &MarkerSet) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            let line = line.as_ref();
            match from.classify(line) {
                Some(marker) => {
                    let cr = if line.ends_with('\r') { "\r" } else { "" };
                    format!("{}{cr}", to.literal(marker))
                }
                None => line.to_string(),
            }
        })
        .collect()
}
