//! Workspace display formatting

use crate::models::Workspace;
use crate::services::BalanceReport;

/// Format workspaces as a table
pub fn format_workspace_list(workspaces: &[Workspace]) -> String {
    if workspaces.is_empty() {
        return "No workspaces found.".to_string();
    }

    let name_width = workspaces
        .iter()
        .map(|ws| ws.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<11}  {:<name_width$}  {:<8}  {:>14}\n",
        "ID",
        "Name",
        "Currency",
        "Balance",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<11}  {:-<name_width$}  {:-<8}  {:->14}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for ws in workspaces {
        output.push_str(&format!(
            "{:<11}  {:<name_width$}  {:<8}  {:>14}\n",
            ws.id.short(),
            ws.name,
            ws.currency,
            ws.total_balance.to_string(),
            name_width = name_width,
        ));
    }

    output
}

pub fn format_workspace_details(workspace: &Workspace, bucket_count: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("Workspace: {}\n", workspace.name));
    output.push_str(&format!("  ID:        {}\n", workspace.id));
    output.push_str(&format!("  Owner:     {}\n", workspace.owner_id));
    output.push_str(&format!("  Currency:  {}\n", workspace.currency));
    output.push_str(&format!("  Balance:   {}\n", workspace.format(workspace.total_balance)));
    output.push_str(&format!("  Buckets:   {}\n", bucket_count));
    output.push_str(&format!(
        "  Created:   {}\n",
        workspace.created_at.format("%Y-%m-%d %H:%M")
    ));

    output
}

/// Format the result of a balance check
pub fn format_balance_report(workspace: &Workspace, report: &BalanceReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("Balance check: {}\n", workspace.name));
    output.push_str(&format!("  Recorded total: {:>14}\n", report.recorded_total.to_string()));
    output.push_str(&format!("  Sum of buckets: {:>14}\n", report.bucket_sum.to_string()));
    output.push_str(&format!("  Inbox buckets:  {:>14}\n", report.inbox_count));
    output.push('\n');

    if report.is_consistent() {
        output.push_str("OK: workspace is consistent\n");
    } else {
        if report.recorded_total != report.bucket_sum {
            output.push_str(&format!("DRIFT: recorded total is off by {}\n", report.drift()));
        }
        if report.inbox_count != 1 {
            output.push_str(&format!(
                "BROKEN: expected exactly one inbox, found {}\n",
                report.inbox_count
            ));
        }
    }

    output
}
