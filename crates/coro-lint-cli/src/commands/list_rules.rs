//! List rules command implementation.

use coro_lint_rules::issues;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!(
        "{:<20} {:<24} {:<9} {:<8} Category",
        "Id", "Name", "Severity", "Priority"
    );
    println!("{}", "-".repeat(80));

    for issue in issues() {
        println!(
            "{:<20} {:<24} {:<9} {:<8} {}",
            issue.id, issue.name, issue.severity, issue.priority, issue.category.name
        );
        println!("  {}", issue.explanation);
    }

    println!("\nUse --rules to run specific rules, e.g.:");
    println!("  coro-lint check --rules GlobalScopeUsage");
    println!("  coro-lint check --rules job-in-builder-usage");
    println!("\nSuppress a finding with @Suppress(\"<Id>\") on the enclosing class");
    println!("or a `// coro-lint: allow(<Id>)` comment on the line.");
}
