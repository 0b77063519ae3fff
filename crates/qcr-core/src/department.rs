//! Department labels.
//!
//! The shop's department names are a short fixed list. Anything outside it is
//! kept, title-cased, rather than rejected.

/// Map a free-text department label onto the fixed taxonomy.
pub fn normalize_department(label: &str) -> Option<String> {
  let folded = label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
  let known = match folded.as_str() {
    "" => return None,
    "assembly" | "assy" => "Assembly",
    "presses" | "press" => "Presses",
    "routers" | "router" => "Routers",
    "saws" | "saw" => "Saws",
    "waterjets" | "waterjet" | "water jets" | "water jet" => "Water Jets",
    "mill" | "mills" => "Mill",
    "sampling" | "sampling department" => "Sampling",
    "paint" => "Paint",
    _ => return Some(title_case(&folded)),
  };
  Some(known.to_string())
}

/// Guess a department from words in the operator token or part name.
///
/// Matches whole words only, so a name like `Bert` is not read as the
/// router code `RT`.
pub fn infer_department(worker: Option<&str>, part_name: Option<&str>) -> Option<String> {
  let worker = words(worker.unwrap_or_default());
  let part = words(part_name.unwrap_or_default());
  let has = |ws: &[String], keys: &[&str]| ws.iter().any(|w| keys.contains(&w.as_str()));

  let label = if has(&worker, &["ASSEMBLY", "ASSY"]) || has(&part, &["ASSEMBLY", "ASSY"]) {
    "Assembly"
  } else if has(&worker, &["WATERJET", "WJ"]) {
    "Water Jets"
  } else if has(&worker, &["ROUTER", "RT"]) {
    "Routers"
  } else if has(&worker, &["SAW"]) {
    "Saws"
  } else if has(&worker, &["PRESS"]) {
    "Presses"
  } else {
    return None;
  };
  Some(label.to_string())
}

fn words(s: &str) -> Vec<String> {
  s.split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
    .map(str::to_uppercase)
    .collect()
}

/// Upper-case the first letter of each whitespace-separated word and
/// lower-case the rest.
pub fn title_case(s: &str) -> String {
  s.split_whitespace()
    .map(|w| {
      let mut chars = w.chars();
      match chars.next() {
        Some(first) => {
          first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
        }
        None => String::new(),
      }
    })
    .collect::<Vec<String>>()
    .join(" ")
}
