use crate::report::{Violation, Warning};
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().header.clone()));
}

pub fn status(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, label.style(theme().dim.clone()), value);
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn phase(name: &str) {
    println!();
    println!(
        "{} {}",
        Icons::GEAR.style(theme().info.clone()),
        name.style(theme().header.clone())
    );
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted.clone()).to_string()
}

/// One planned relocation, `from -> to`
pub fn move_line(from: &str, to: &str) {
    println!(
        "  {} {} {}",
        from.style(theme().muted.clone()),
        Icons::ARROW,
        to.style(theme().path.clone())
    );
}

/// One fatal violation with its kind tag
pub fn violation_line(v: &Violation) {
    eprintln!(
        "{} {} {}",
        Icons::CROSS,
        format!("[{}]", v.kind()).style(theme().error.clone()),
        v
    );
}

/// One advisory warning with its kind tag
pub fn warning_line(w: &Warning) {
    eprintln!(
        "{} {} {}",
        Icons::WARN,
        format!("[{}]", w.kind()).style(theme().warn.clone()),
        w
    );
}
