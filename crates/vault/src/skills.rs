//! Skills index parsing.
//!
//! The agent's capabilities are listed in `SKILLS-INDEX.md`:
//!
//! ```text
//! ## Communication
//! - **email-triage**: Sort the inbox by urgency
//!
//! ## Finance
//! | Skill | Description |
//! |-------|-------------|
//! | odoo-invoice | Create invoices in Odoo |
//! ```

use crate::entities::{Skill, SkillCategory, SkillStatus};

const DEFAULT_CATEGORY: &str = "General";

/// Parse the skills index document.
pub fn parse_skills_index(markdown: &str) -> Vec<Skill> {
    let mut category = DEFAULT_CATEGORY.to_string();
    let mut skills = Vec::new();

    for line in markdown.lines().map(str::trim) {
        if let Some(heading) = line.strip_prefix("## ") {
            category = heading.trim().to_string();
            continue;
        }

        let parsed = if line.starts_with('|') {
            parse_table_row(line)
        } else if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            parse_list_item(item)
        } else {
            None
        };

        if let Some((name, description)) = parsed {
            skills.push(Skill {
                name,
                description,
                category: category.clone(),
                status: Some(SkillStatus::Available),
            });
        }
    }

    skills
}

fn parse_list_item(item: &str) -> Option<(String, String)> {
    let (name, description) = item.split_once(':')?;
    let name = name.trim().trim_matches('*').trim_matches('`').trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), description.trim().to_string()))
}

fn parse_table_row(line: &str) -> Option<(String, String)> {
    let cells: Vec<&str> = line
        .trim_matches('|')
        .split('|')
        .map(str::trim)
        .collect();
    if cells.len() < 2 {
        return None;
    }

    let name = cells[0].trim_matches('*').trim_matches('`').trim();
    let is_separator = cells.iter().all(|c| c.chars().all(|ch| ch == '-' || ch == ':'));
    if name.is_empty() || is_separator || name.eq_ignore_ascii_case("skill") || name.eq_ignore_ascii_case("name") {
        return None;
    }

    Some((name.to_string(), cells[1].to_string()))
}

/// Group skills by category, keeping first-seen category order.
pub fn group_by_category(skills: &[Skill]) -> Vec<SkillCategory> {
    let mut groups: Vec<SkillCategory> = Vec::new();
    for skill in skills {
        match groups.iter_mut().find(|g| g.name == skill.category) {
            Some(group) => group.skills.push(skill.clone()),
            None => groups.push(SkillCategory {
                name: skill.category.clone(),
                skills: vec![skill.clone()],
            }),
        }
    }
    groups
}
