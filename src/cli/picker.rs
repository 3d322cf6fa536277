//! Terminal rendering of branch pickers.

use std::collections::BTreeSet;
use std::io::{BufRead, Write};

use anyhow::Result;
use crossterm::style::Stylize;

use super::prompt::Prompter;
use crate::branch::{BranchPresentation, SectionKind};

fn section_title(kind: &SectionKind) -> String {
    match kind {
        SectionKind::Pinned => "📌 Pinned".to_string(),
        SectionKind::Category(category) => format!("{category}/"),
        SectionKind::All => "Branches".to_string(),
    }
}

/// Renders `presentation` as numbered lines grouped under section titles.
///
/// With `checked`, every entry gets a checkbox.
pub fn render(presentation: &BranchPresentation, checked: Option<&BTreeSet<String>>) -> String {
    let mut out = String::new();
    let mut number = 1;

    for section in presentation.sections() {
        out.push_str(&format!("  {}\n", section_title(&section.kind).bold()));
        for branch in &section.branches {
            let checkbox = match checked {
                Some(set) if set.contains(&branch.name) => "[x] ",
                Some(_) => "[ ] ",
                None => "",
            };
            out.push_str(&format!(
                "  {number:>3}. {checkbox}{}  {}\n",
                branch.name,
                format!("({})", branch.last_commit_time_formatted).dim()
            ));
            number += 1;
        }
    }
    out
}

/// Parses `1 3 5-7` / `1,3,5-7` into zero-based indices below `max`.
pub fn parse_selection(input: &str, max: usize) -> Result<Vec<usize>, String> {
    let mut indices = Vec::new();

    for token in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let (start, end) = match token.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (token, token),
        };
        let parse = |s: &str| {
            s.parse::<usize>()
                .ok()
                .filter(|n| (1..=max).contains(n))
                .ok_or_else(|| format!("'{token}' is not a number between 1 and {max}"))
        };
        let (start, end) = (parse(start)?, parse(end)?);
        if start > end {
            return Err(format!("'{token}' is not an ascending range"));
        }
        indices.extend((start - 1)..end);
    }

    if indices.is_empty() {
        return Err("nothing selected".to_string());
    }
    Ok(indices)
}

/// Single-select picker with substring filtering.
///
/// A number chooses, text filters, empty input takes the default and `q`
/// aborts. A leading `/` forces filtering, so `/2024` finds a branch named
/// `2024` instead of picking entry 2024. An empty presentation returns `None`
/// without prompting.
pub fn pick_branch<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    message: &str,
    presentation: &BranchPresentation,
) -> Result<Option<String>> {
    if presentation.is_empty() {
        return Ok(None);
    }

    let mut view = presentation.clone();
    loop {
        prompter.say(message)?;
        write!(prompter.output(), "{}", render(&view, None))?;

        let default = view.default_choice().unwrap_or_default().to_string();
        let answer = prompter.ask(&format!(
            "Number, text (or /text) to filter, q to cancel [{default}]:"
        ))?;

        match answer.as_str() {
            "" => return Ok(Some(default)),
            "q" | "Q" => return Ok(None),
            _ => {}
        }

        let query = match answer.strip_prefix('/') {
            Some(query) => query,
            None => {
                if let Ok(n) = answer.parse::<usize>() {
                    match view.get(n.wrapping_sub(1)) {
                        Some(branch) => return Ok(Some(branch.name.clone())),
                        None => {
                            prompter.say(format!(
                                "Please enter a number between 1 and {}.",
                                view.len()
                            ))?;
                            continue;
                        }
                    }
                }
                answer.as_str()
            }
        };

        let filtered = presentation.filter(query);
        match filtered.len() {
            0 => prompter.say(format!("No branches match '{query}'.").yellow().to_string())?,
            1 => return Ok(filtered.default_choice().map(str::to_string)),
            _ => view = filtered,
        }
    }
}

/// Checkbox multi-select. Returns the checked names in display order.
///
/// Numbers or ranges toggle entries, `a` checks all, `n` clears, empty input
/// confirms and `q` aborts with nothing selected.
pub fn pick_many<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    message: &str,
    presentation: &BranchPresentation,
    prechecked: &[String],
) -> Result<Vec<String>> {
    if presentation.is_empty() {
        return Ok(Vec::new());
    }

    let names: Vec<String> = presentation.names().into_iter().map(String::from).collect();
    let mut checked: BTreeSet<String> = prechecked
        .iter()
        .filter(|p| names.contains(*p))
        .cloned()
        .collect();

    loop {
        prompter.say(message)?;
        write!(prompter.output(), "{}", render(presentation, Some(&checked)))?;
        let answer = prompter.ask("Toggle numbers (e.g. 1 3 5-7), a = all, n = none, q = cancel, Enter = done:")?;

        match answer.as_str() {
            "" => {
                return Ok(names.into_iter().filter(|n| checked.contains(n)).collect());
            }
            "q" | "Q" => return Ok(Vec::new()),
            "a" | "A" => checked = names.iter().cloned().collect(),
            "n" | "N" => checked.clear(),
            _ => match parse_selection(&answer, names.len()) {
                Ok(indices) => {
                    for i in indices {
                        let name = &names[i];
                        if !checked.remove(name) {
                            checked.insert(name.clone());
                        }
                    }
                }
                Err(e) => prompter.say(e.yellow().to_string())?,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::branch::BranchDescriptor;
    use crate::cli::prompt::tests::{scripted, transcript};

    fn presentation(names: &[&str], pins: &[&str]) -> BranchPresentation {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let candidates = names
            .iter()
            .map(|n| BranchDescriptor::new(n, Some(now.timestamp() - 3600), now))
            .collect();
        let pins: Vec<String> = pins.iter().map(|p| (*p).to_string()).collect();
        BranchPresentation::category_view(candidates, &pins)
    }

    #[test]
    fn selection_parsing() {
        assert_eq!(parse_selection("1 3", 5), Ok(vec![0, 2]));
        assert_eq!(parse_selection("2-4,5", 5), Ok(vec![1, 2, 3, 4]));
        assert!(parse_selection("6", 5).is_err());
        assert!(parse_selection("4-2", 5).is_err());
        assert!(parse_selection("x", 5).is_err());
        assert!(parse_selection(" , ", 5).is_err());
    }

    #[test]
    fn render_numbers_across_sections() {
        let text = render(&presentation(&["feat/a", "main"], &["main"]), None);
        assert!(text.contains("1. main"));
        assert!(text.contains("2. feat/a"));
        assert!(text.contains("(1h ago)"));
        assert!(text.contains("Pinned"));
    }

    #[test]
    fn render_checkboxes() {
        let checked: BTreeSet<String> = ["main".to_string()].into();
        let text = render(&presentation(&["feat/a", "main"], &[]), Some(&checked));
        assert!(text.contains("[ ] feat/a"));
        assert!(text.contains("[x] main"));
    }

    #[test]
    fn pick_default_is_first_pinned() {
        let mut p = scripted("\n");
        let picked = pick_branch(&mut p, "Target branch", &presentation(&["feat/a", "main"], &["main"]));
        assert_eq!(picked.unwrap().as_deref(), Some("main"));
    }

    #[test]
    fn pick_by_number_after_filter() {
        let mut p = scripted("fix\n2\n");
        let view = presentation(&["feat/a", "fix/b", "fix/c", "main"], &[]);
        let picked = pick_branch(&mut p, "Target branch", &view).unwrap();
        assert_eq!(picked.as_deref(), Some("fix/c"));
    }

    #[test]
    fn unique_filter_match_is_chosen() {
        let mut p = scripted("zzz\nMAI\n");
        let view = presentation(&["feat/a", "main"], &[]);
        assert_eq!(pick_branch(&mut p, "Target", &view).unwrap().as_deref(), Some("main"));
        assert!(transcript(p).contains("No branches match 'zzz'"));
    }

    #[test]
    fn slash_prefix_filters_numeric_names() {
        let view = presentation(&["2024", "feat/a", "main"], &[]);
        let mut p = scripted("/2024\n");
        assert_eq!(pick_branch(&mut p, "Target", &view).unwrap().as_deref(), Some("2024"));

        let mut p = scripted("2024\n/2024\n");
        assert_eq!(pick_branch(&mut p, "Target", &view).unwrap().as_deref(), Some("2024"));
        assert!(transcript(p).contains("Please enter a number between 1 and 3"));
    }

    #[test]
    fn empty_presentation_short_circuits() {
        let mut p = scripted("");
        assert_eq!(pick_branch(&mut p, "Target", &BranchPresentation::default()).unwrap(), None);
        assert!(pick_many(&mut p, "Pin", &BranchPresentation::default(), &[]).unwrap().is_empty());
        assert!(transcript(p).is_empty());
    }

    #[test]
    fn pick_many_toggles_and_keeps_order() {
        let mut p = scripted("1 3\n1\n2\n\n");
        let view = BranchPresentation::flat_view(
            presentation(&["a", "b", "c"], &[]).branches().cloned().collect(),
            &[],
        );
        let picked = pick_many(&mut p, "Pin", &view, &["a".to_string()]).unwrap();
        assert_eq!(picked, vec!["a", "b", "c"]);
    }

    #[test]
    fn pick_many_cancel_and_all() {
        let view = presentation(&["a", "b"], &[]);
        assert!(pick_many(&mut scripted("a\nq\n"), "Pin", &view, &[]).unwrap().is_empty());
        assert_eq!(
            pick_many(&mut scripted("a\n\n"), "Pin", &view, &[]).unwrap().len(),
            2
        );
    }
}
