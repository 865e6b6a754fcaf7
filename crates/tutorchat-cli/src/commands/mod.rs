pub mod chat;
pub mod dashboard;

use tutorchat::EngineResult;

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> EngineResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
