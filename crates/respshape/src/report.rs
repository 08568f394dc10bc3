//! Console summary printed after a successful forward run.

use std::io::{self, Write};

use respshape_common::discriminators::PROXY;

/// Consumer keys of the provisioned apps, in app order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSummary {
    pub app_keys: Vec<String>,
}

/// `(resource, app index)` of each sample request.
const SAMPLE_REQUESTS: [(&str, u8); 4] = [
    ("iata-t1", 1),
    ("iata-t2", 1),
    ("iata-t2", 2),
    ("iata-t3", 1),
];

impl ProvisionSummary {
    /// Writes the key assignments and sample requests.
    ///
    /// The `$ORG` and `$ENV` placeholders are left for the shell.
    ///
    /// # Errors
    ///
    /// Returns any error from `out`.
    pub fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out)?;
        for (i, key) in self.app_keys.iter().enumerate() {
            writeln!(out, "app{}_client_id={key}", i + 1)?;
        }
        writeln!(out)?;
        for (resource, app) in SAMPLE_REQUESTS {
            writeln!(
                out,
                "curl -i -X GET \"https://$ORG-$ENV.apigee.net/{PROXY}/{resource}/SEATTLE\" -H apikey:$app{app}_client_id"
            )?;
        }
        writeln!(out)
    }
}
