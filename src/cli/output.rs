//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::auth::models::{Role, UserView};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

fn role_color(role: Role) -> Color {
    match role {
        Role::Admin => Color::Magenta,
        Role::User => Color::Green,
    }
}

/// Build the user listing table
pub fn user_table(users: &[UserView]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(Color::Cyan),
            Cell::new("Name").fg(Color::Cyan),
            Cell::new("Email").fg(Color::Cyan),
            Cell::new("Role").fg(Color::Cyan),
            Cell::new("Site").fg(Color::Cyan),
            Cell::new("Designation").fg(Color::Cyan),
        ]);

    for user in users {
        let site = user
            .site_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(user.id),
            Cell::new(&user.name),
            Cell::new(&user.email),
            Cell::new(user.role).fg(role_color(user.role)),
            Cell::new(site),
            Cell::new(user.designation.as_deref().unwrap_or("-")),
        ]);
    }

    table
}

/// Print a table of users
pub fn print_user_table(users: &[UserView]) {
    if users.is_empty() {
        info("No users found. Create one with 'grovekeeper create-admin'");
        return;
    }
    println!("{}", user_table(users));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Gender;
    use uuid::Uuid;

    #[test]
    fn test_user_table_rows() {
        let users = vec![UserView {
            id: Uuid::new_v4(),
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            role: Role::Admin,
            site_id: None,
            gender: Gender::Female,
            designation: Some("Ranger".to_string()),
        }];

        let rendered = user_table(&users).to_string();
        assert!(rendered.contains("asha@example.com"));
        assert!(rendered.contains("admin"));
        assert!(rendered.contains("Ranger"));
    }
}
