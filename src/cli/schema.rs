use crate::config::Config;
use schemars::schema::RootSchema;
use schemars::schema_for;

/// JSON Schema of `hausarbeit.yaml`
pub fn config_schema() -> RootSchema {
    schema_for!(Config)
}

pub fn execute() -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&config_schema())?);
    Ok(())
}
