//! Device enumeration through nvidia-smi.

use std::process::Command;

use todo_ai_common::{DeviceInfo, DeviceMemory};

use super::{DeviceQuery, ProbeError};

const QUERY_FIELDS: &str = "--query-gpu=index,name,memory.total,memory.reserved,memory.used";
/// Drivers that predate `memory.reserved` reject the whole query.
const LEGACY_QUERY_FIELDS: &str = "--query-gpu=index,name,memory.total,memory.used";
const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Column layout of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    WithReserved,
    Legacy,
}

impl Layout {
    fn fields(self) -> &'static str {
        match self {
            Layout::WithReserved => QUERY_FIELDS,
            Layout::Legacy => LEGACY_QUERY_FIELDS,
        }
    }
}

/// Queries NVIDIA devices by running nvidia-smi.
///
/// `memory.used` is reported as allocated memory. Fields the driver cannot
/// report (`[N/A]`, `[Not Supported]`) read as zero, as does reserved memory
/// on drivers without `memory.reserved`.
pub struct NvidiaSmi {
    binary: String,
}

impl NvidiaSmi {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }

    fn run(&self, layout: Layout) -> Result<String, ProbeError> {
        let output = Command::new(&self.binary)
            .args([layout.fields(), "--format=csv,noheader,nounits"])
            .output()
            .map_err(|e| ProbeError::Unavailable {
                binary: self.binary.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                binary: self.binary.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for NvidiaSmi {
    fn default() -> Self {
        Self::new("nvidia-smi")
    }
}

impl DeviceQuery for NvidiaSmi {
    fn name(&self) -> &str {
        &self.binary
    }

    fn devices(&self) -> Result<Vec<DeviceInfo>, ProbeError> {
        query_devices(|layout| self.run(layout))
    }
}

/// Run the full query, retrying with the legacy layout if the command fails.
fn query_devices<F>(run: F) -> Result<Vec<DeviceInfo>, ProbeError>
where
    F: Fn(Layout) -> Result<String, ProbeError>,
{
    match run(Layout::WithReserved) {
        Ok(output) => parse_query_output(&output, Layout::WithReserved),
        Err(ProbeError::CommandFailed { stderr, .. }) => {
            tracing::debug!(
                "Full device query rejected ({}), retrying without memory.reserved",
                stderr
            );
            parse_query_output(&run(Layout::Legacy)?, Layout::Legacy)
        }
        Err(e) => Err(e),
    }
}

/// Parse `--format=csv,noheader,nounits` output, one device per line.
fn parse_query_output(output: &str, layout: Layout) -> Result<Vec<DeviceInfo>, ProbeError> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| parse_device_line(line, layout))
        .collect()
}

fn parse_device_line(line: &str, layout: Layout) -> Result<DeviceInfo, ProbeError> {
    let parse_error = || ProbeError::Parse(line.to_string());

    // Names may contain commas; index is first and the memory fields are last.
    let memory_fields = match layout {
        Layout::WithReserved => 3,
        Layout::Legacy => 2,
    };
    let mut fields = line.rsplitn(memory_fields + 1, ',');
    let used = fields.next().ok_or_else(parse_error)?;
    let reserved = match layout {
        Layout::WithReserved => Some(fields.next().ok_or_else(parse_error)?),
        Layout::Legacy => None,
    };
    let total = fields.next().ok_or_else(parse_error)?;
    let head = fields.next().ok_or_else(parse_error)?;

    let (index, name) = head.split_once(',').ok_or_else(parse_error)?;

    let index = index.trim().parse::<u32>().map_err(|_| parse_error())?;

    Ok(DeviceInfo {
        index,
        name: name.trim().to_string(),
        memory: DeviceMemory {
            total_bytes: parse_mib(total, line)?,
            reserved_bytes: match reserved {
                Some(reserved) => parse_mib(reserved, line)?,
                None => 0,
            },
            allocated_bytes: parse_mib(used, line)?,
        },
    })
}

fn parse_mib(field: &str, line: &str) -> Result<u64, ProbeError> {
    let field = field.trim();
    if field.starts_with('[') {
        return Ok(0);
    }
    field
        .parse::<u64>()
        .ok()
        .and_then(|mib| mib.checked_mul(BYTES_PER_MIB))
        .ok_or_else(|| ProbeError::Parse(line.to_string()))
}
