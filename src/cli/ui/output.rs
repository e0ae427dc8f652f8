use console::{StyledObject, style};

use crate::types::{Action, Recommendation};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    pub fn kv(&self, key: &str, value: impl std::fmt::Display) {
        println!("  {:<18} {}", style(key).dim(), value);
    }

    pub fn recommendation(&self, rec: &Recommendation) {
        let indent = match rec.level {
            crate::types::HeadingLevel::H3 => "  ",
            _ => "",
        };
        let heading = match &rec.existing_heading {
            Some(before) if before != rec.final_heading() => {
                format!("{} → {}", before, rec.final_heading())
            }
            Some(before) => before.clone(),
            None => rec.final_heading().to_string(),
        };
        println!("  {}{:<8} {}", indent, action_badge(rec.action), heading);
        println!("  {}         {}", indent, style(&rec.reason).dim());
        for sub in &rec.subheadings {
            println!("  {}         {} {}", indent, style("↳").dim(), sub);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

fn action_badge(action: Action) -> StyledObject<String> {
    let label = action.to_string();
    match action {
        Action::Keep => style(label).green(),
        Action::Improve => style(label).yellow(),
        Action::Add => style(label).cyan(),
        Action::Remove => style(label).red(),
    }
}
