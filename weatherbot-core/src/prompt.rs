use crate::{
    provider::FORECAST_DAYS,
    tools::{ToolKind, ToolSet},
};

/// Build the fixed system instruction for a session using `tool_set`.
///
/// It only names tools that are actually declared, so a forecast-only
/// session never points the model at a missing current-conditions tool.
pub fn system_instruction(tool_set: ToolSet) -> String {
    let tools = tool_set.tools();

    let tool_lines: Vec<String> = tools
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let when = match kind {
                ToolKind::CurrentWeather => {
                    "use it when the user explicitly asks about the CURRENT weather, the weather NOW or in REAL TIME."
                }
                ToolKind::WeatherForecast if tool_set == ToolSet::ForecastOnly => {
                    "use it for every weather question, including questions about today."
                }
                ToolKind::WeatherForecast => {
                    "use it when the user asks for a FORECAST, about TOMORROW or the NEXT DAYS."
                }
            };
            format!("{}. '{}': {}", i + 1, kind.name(), when)
        })
        .collect();

    let coverage = if tool_set.contains(ToolKind::CurrentWeather) {
        format!("the current weather and a {FORECAST_DAYS}-day forecast")
    } else {
        format!("a {FORECAST_DAYS}-day forecast")
    };

    format!(
        "You are a helpful and precise weather assistant. You have access to {count} tool{plural}:\n\
         {tools}\n\
         \n\
         Guidelines:\n\
         - Whenever the user asks about the weather, pick the correct tool and call it.\n\
         - If the user asks about the past (e.g. \"Did it rain yesterday?\"), politely explain \
         that your data only covers {coverage}, and do not call any tool.\n\
         - If a tool reports that a location could not be found, tell the user so.\n\
         - Format answers cleanly, in a friendly and professional tone, using Markdown.",
        count = tools.len(),
        plural = if tools.len() == 1 { "" } else { "s" },
        tools = tool_lines.join("\n"),
    )
}
