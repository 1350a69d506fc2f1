pub mod inspect;
pub mod prepare;

use dockprep::engine::findings::RepairFinding;

pub(crate) fn print_findings(findings: &[RepairFinding]) {
    if findings.is_empty() {
        println!("No problems found.");
        return;
    }
    println!("{} finding(s):", findings.len());
    for finding in findings {
        println!("  {}", finding);
    }
}
