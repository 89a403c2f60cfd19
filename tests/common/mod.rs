use assert_cmd::cargo_bin;
use std::io::{Error, Write};
use std::process::Command;
use tempfile::NamedTempFile;

const RELAY_VARS: [&str; 5] = [
    "SOI_SERVICE_ID",
    "SOI_ORDER_TEMPLATE_ID",
    "SOI_INQUIRY_TEMPLATE_ID",
    "SOI_PUBLIC_KEY",
    "SOI_UPI_ID",
];

/// The binary with no relay credentials inherited from the environment.
pub fn checkout_cmd() -> Command {
    let mut cmd = Command::new(cargo_bin!("soi-checkout"));
    for var in RELAY_VARS {
        cmd.env_remove(var);
    }
    cmd.env("RUST_LOG", "info");
    cmd
}

pub fn write_cart(rows: &[&str]) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "product,variant,quantity")?;
    for row in rows {
        writeln!(file, "{row}")?;
    }
    Ok(file)
}

pub fn write_details(pincode: &str) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"{{"name": "Asha Rao", "email": "asha@example.com", "phone": "9820000000",
            "address": "12 Marine Drive", "city": "Mumbai", "state": "Maharashtra",
            "pincode": "{pincode}"}}"#
    )?;
    Ok(file)
}
