//! Single-pass section scanner.
//!
//! Each section is walked once: decode, classify, resolve branches, apply
//! policy, report. Sections are independent and only share the read-only
//! policy inputs, so they can be scanned on the rayon pool; per-section
//! results are merged in section-name order either way.

use rayon::prelude::*;
use tracing::{debug, info, info_span, trace};

use super::config::AuditConfig;
use super::finding::{Finding, Reporter};
use super::policy::{PolicyEngine, Verdict};
use super::{AuditReport, SectionStats};
use crate::error::Result;
use crate::image::{ObjectImage, Section};
use crate::log_error;
use crate::thumb::{classify, BranchInstruction, Decoded, Instruction, InstructionStream, Opcode};

/// Result of scanning one section.
#[derive(Debug)]
pub struct SectionScan {
    pub stats: SectionStats,
    pub reporter: Reporter,
}

/// Audit `image` under `config`.
///
/// Configuration, decode and integrity problems abort the run; findings do not.
pub fn audit(image: &ObjectImage, config: &AuditConfig) -> Result<AuditReport> {
    let layout = image
        .layout(&config.privileged_section, &config.sections)
        .map_err(|e| log_error!(e))?;
    let policy = PolicyEngine::new(layout.privileged, layout.symbols, &config.allow_list);

    let scans: Vec<SectionScan> = if config.parallel {
        layout
            .sections
            .par_iter()
            .map(|section| scan_section(section, &policy, config.scan_unaligned))
            .collect::<Result<Vec<_>>>()
    } else {
        layout
            .sections
            .iter()
            .map(|section| scan_section(section, &policy, config.scan_unaligned))
            .collect::<Result<Vec<_>>>()
    }
    .map_err(|e| log_error!(e))?;

    let mut reporter = Reporter::new();
    let mut sections = Vec::with_capacity(scans.len());
    for scan in scans {
        sections.push(scan.stats);
        reporter.merge(scan.reporter);
    }

    let report = AuditReport {
        privileged: layout.privileged,
        sections,
        findings: reporter.into_findings(),
    };
    info!(
        findings = report.findings.len(),
        sections = report.sections.len(),
        "Audit complete"
    );
    Ok(report)
}

/// Walk one section to completion, or to the first fatal error.
pub fn scan_section(
    section: &Section,
    policy: &PolicyEngine<'_>,
    unaligned: bool,
) -> Result<SectionScan> {
    let span = info_span!("scan_section", section = section.name());
    let _guard = span.enter();

    let mut scan = SectionScan {
        stats: SectionStats::new(section.name()),
        reporter: Reporter::new(),
    };

    for step in InstructionStream::new(section, unaligned) {
        match step? {
            Decoded::Aligned(ins) => {
                scan.stats.instructions += 1;
                inspect(section, &ins, false, policy, &mut scan)?;
            }
            Decoded::Shifted(ins) => {
                scan.stats.shifted += 1;
                inspect(section, &ins, true, policy, &mut scan)?;
            }
            Decoded::Sentinel(address) => {
                scan.stats.sentinels += 1;
                trace!(address = format_args!("{:#x}", address), "CFI sentinel");
            }
        }
    }
    scan.stats.findings = scan.reporter.len();

    debug!(
        instructions = scan.stats.instructions,
        shifted = scan.stats.shifted,
        sentinels = scan.stats.sentinels,
        branches = scan.stats.branches,
        findings = scan.stats.findings,
        "Section scanned"
    );
    Ok(scan)
}

fn inspect(
    section: &Section,
    ins: &Instruction,
    unaligned: bool,
    policy: &PolicyEngine<'_>,
    scan: &mut SectionScan,
) -> Result<()> {
    let Some(opcode) = classify(ins) else {
        return Ok(());
    };

    match opcode {
        Opcode::Cps | Opcode::Msr => {
            scan.reporter.report(Finding::privileged_instruction(
                section.name(),
                ins,
                opcode,
                unaligned,
            ));
        }
        Opcode::Branch(kind) => {
            let branch = BranchInstruction::new(ins.address, ins.raw, kind);
            scan.stats.branches += 1;
            match policy.evaluate(section.name(), &branch)? {
                Verdict::Unauthorized(name) => {
                    scan.reporter
                        .report(Finding::unauthorized_call(section.name(), &branch, name));
                }
                Verdict::Allowed(name) => {
                    trace!(
                        target_fn = %name,
                        address = format_args!("{:#x}", branch.address),
                        "Approved privileged call"
                    );
                }
                Verdict::Outside => {}
            }
        }
    }
    Ok(())
}
