// Console summary of a pipeline run

use crate::pipeline::RunSummary;

pub fn generate_run_report(summary: &RunSummary) -> String {
    let mut report = String::new();

    report.push_str("\n═══════════════════════════════════════════════════════════════════════════════\n");
    report.push_str("                            RUN SUMMARY\n");
    report.push_str("═══════════════════════════════════════════════════════════════════════════════\n\n");

    report.push_str(&format!("Domains: {}\n", summary.domains));
    report.push_str(&format!("Archived pages: {}\n", summary.pages));
    report.push_str(&format!("JavaScript assets: {}\n", summary.assets));
    report.push_str(&format!("Endpoints extracted: {}\n", summary.endpoints));
    report.push_str(&format!("Parameters extracted: {}\n", summary.parameters));
    report.push_str(&format!("Payloads dispatched: {}\n\n", summary.payloads));

    let dispatch = &summary.dispatch;
    report.push_str(&format!(
        "Probes resolved: {}/{}\n",
        dispatch.completed, dispatch.submitted
    ));
    report.push_str(&format!("  Success: {}\n", dispatch.succeeded));
    report.push_str(&format!("  HTTP errors: {}\n", dispatch.http_errors));
    report.push_str(&format!("  Timeouts: {}\n", dispatch.timeouts));
    report.push_str(&format!("  Connection errors: {}\n", dispatch.failed));

    if !dispatch.by_status.is_empty() {
        report.push_str("\n───────────────────────────────────────────────────────────────────────────────\n");
        for (status_code, count) in &dispatch.by_status {
            let status_label = match status_code {
                200..=299 => format!("[{}] Success", status_code),
                300..=399 => format!("[{}] Redirect", status_code),
                400..=499 => format!("[{}] Client Error", status_code),
                500..=599 => format!("[{}] Server Error", status_code),
                _ => format!("[{}]", status_code),
            };
            report.push_str(&format!("  {} ({} probes)\n", status_label, count));
        }
    }

    report.push_str("\n═══════════════════════════════════════════════════════════════════════════════\n");

    report
}
