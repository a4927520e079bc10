use crate::error::BenchError;
use crate::infra::journal::{CommandJournal, JournalEventType};
use crate::procedure::{Procedure, Runner};
use crate::rig::{OpenOptions, Rig, RigConfig};
use crate::runtime::config::RuntimeConfig;
use crate::runtime::logging::init_tracing;
use crate::runtime::telemetry;
use std::path::Path;
use tracing::{error, info, warn};

pub fn run_from_args() -> Result<(), BenchError> {
    let config = RuntimeConfig::from_env()?;
    if config.show_help {
        RuntimeConfig::print_help();
        return Ok(());
    }
    if config.list_profiles {
        for name in scpi_core::profiles::BUILTIN {
            if let Some(profile) = scpi_core::profiles::by_name(name) {
                println!("{:<16} {}", name, profile.model);
            }
        }
        return Ok(());
    }
    run(config)
}

pub fn run(config: RuntimeConfig) -> Result<(), BenchError> {
    init_tracing(config.json_logs);
    telemetry::init();
    let _metrics_handle = telemetry::start_metrics_server(&config.metrics_addr);

    let rig_config = match &config.rig_path {
        Some(path) => RigConfig::load(path)?,
        None => RigConfig::default_bench()?,
    };
    let procedure = match &config.procedure_path {
        Some(path) => Procedure::load(path)?,
        None => Procedure::default_bench(),
    };
    let journal = init_journal(config.journal_path.as_deref())?;

    info!(
        rig = rig_config.name.as_deref().unwrap_or("<unnamed>"),
        instruments = rig_config.instruments.len(),
        procedure = %procedure.name,
        simulate = config.simulate,
        "Starting bench run"
    );

    let options = OpenOptions {
        simulate: config.simulate,
        timeout: config.timeout(),
    };
    let result = execute(
        &rig_config,
        &procedure,
        &options,
        config.skip_waits,
        journal.as_ref(),
    );
    telemetry::report();

    if let Some(journal) = &journal {
        let details = match &result {
            Ok(()) => serde_json::json!({ "procedure": procedure.name, "ok": true }),
            Err(e) => serde_json::json!({
                "procedure": procedure.name,
                "ok": false,
                "error": e.to_string(),
            }),
        };
        if let Err(e) = journal.log_event(JournalEventType::ProcedureEnd, details) {
            warn!(error = %e, "Failed to write journal entry");
        }
    }

    if let Err(e) = &result {
        error!(error = %e, "Bench run failed");
    }
    result
}

/// Open the rig, run the procedure and always shut the rig down, keeping
/// the first error.
pub fn execute(
    rig_config: &RigConfig,
    procedure: &Procedure,
    options: &OpenOptions,
    skip_waits: bool,
    journal: Option<&CommandJournal>,
) -> Result<(), BenchError> {
    let mut rig = Rig::open(rig_config, options, journal)?;
    let outcome = Runner::new(journal)
        .skip_waits(skip_waits)
        .run(&mut rig, procedure);

    let failures = rig.shutdown(journal);
    if !failures.is_empty() {
        warn!(count = failures.len(), "Shutdown completed with errors");
    }

    let summary = outcome?;
    info!(
        steps = summary.steps_completed,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "Bench run complete"
    );
    match failures.into_iter().next() {
        Some(first) => Err(first),
        None => Ok(()),
    }
}

fn init_journal(path: Option<&Path>) -> Result<Option<CommandJournal>, BenchError> {
    path.map(|path| -> Result<CommandJournal, BenchError> {
        let journal = CommandJournal::new(path)?;
        info!(path = %path.display(), "Journal enabled");
        Ok(journal)
    })
    .transpose()
}
