use crate::error::BenchError;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub show_help: bool,
    pub list_profiles: bool,
    pub rig_path: Option<PathBuf>,
    pub procedure_path: Option<PathBuf>,
    pub simulate: bool,
    pub skip_waits: bool,
    pub json_logs: bool,
    pub journal_path: Option<PathBuf>,
    pub metrics_addr: Option<String>,
    pub timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            list_profiles: false,
            rig_path: None,
            procedure_path: None,
            simulate: false,
            skip_waits: false,
            json_logs: false,
            journal_path: None,
            metrics_addr: None,
            timeout_ms: scpi_io::DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, BenchError> {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> Result<Self, BenchError> {
        let mut cfg = RuntimeConfig::default();
        let mut i = 1;
        while i < args.len() {
            let flag = args[i].as_str();
            let mut value = || -> Result<String, BenchError> {
                i += 1;
                args.get(i)
                    .cloned()
                    .ok_or_else(|| BenchError::Usage(format!("{} requires a value", flag)))
            };
            match flag {
                "--rig" => {
                    cfg.rig_path = Some(PathBuf::from(value()?));
                }
                "--procedure" => {
                    cfg.procedure_path = Some(PathBuf::from(value()?));
                }
                "--simulate" => {
                    cfg.simulate = true;
                }
                "--no-wait" => {
                    cfg.skip_waits = true;
                }
                "--json-logs" => {
                    cfg.json_logs = true;
                }
                "--journal" => {
                    cfg.journal_path = Some(PathBuf::from(value()?));
                }
                "--metrics-addr" => {
                    cfg.metrics_addr = Some(value()?);
                }
                "--timeout-ms" => {
                    let raw = value()?;
                    cfg.timeout_ms = raw
                        .parse::<u64>()
                        .ok()
                        .filter(|ms| *ms > 0)
                        .ok_or_else(|| {
                            BenchError::Usage(format!("invalid --timeout-ms value '{}'", raw))
                        })?;
                }
                "--list-profiles" => {
                    cfg.list_profiles = true;
                }
                "--help" | "-h" => {
                    cfg.show_help = true;
                    break;
                }
                other => {
                    return Err(BenchError::Usage(format!("unknown argument '{}'", other)));
                }
            }
            i += 1;
        }
        Ok(cfg)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn print_help() {
        println!(
            r#"benchctl - Drive SCPI bench instruments through a scripted procedure

USAGE:
    benchctl [OPTIONS]

OPTIONS:
    --rig <PATH>            Rig file (JSON) naming instruments, profiles and addresses
                            [default: built-in bench of scope, DC supply, AC source, analyzer]
    --procedure <PATH>      Procedure file (JSON) [default: built-in DC ramp capture]
    --simulate              Use in-memory simulated instruments instead of the network
    --no-wait               Skip the delays of wait steps (dry runs)
    --timeout-ms <MS>       Response timeout per query [default: 10000]
    --json-logs             Output logs in JSON format (for log aggregation)
    --metrics-addr <ADDR>   Enable Prometheus metrics server on address (e.g., 0.0.0.0:9090)
    --journal <PATH>        Append a JSONL journal of every step to the given file
    --list-profiles         Print the built-in instrument profiles and exit
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log filter (e.g., RUST_LOG=debug,scpi_core=trace)

EXAMPLES:
    # Dry run of the built-in procedure
    benchctl --simulate --no-wait

    # Bench run with a journal
    benchctl --rig rig.json --procedure ramp.json --journal runs/ramp.jsonl
"#
        );
    }
}
