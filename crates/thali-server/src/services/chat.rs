//! Chat execution service: keyword fast path or agent run.

use thali_tools::MenuCategory;
use tracing::info;

use crate::error::AppError;
use crate::ServerState;

/// Where a chat input is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRoute {
    /// Input is exactly a category name; answered from the menu table.
    Menu(MenuCategory),
    /// Anything else goes to the agent.
    Agent,
}

/// Classifies an input. Only an exact, case-insensitive category name takes
/// the fast path; there is no trimming.
pub fn route(input: &str) -> ChatRoute {
    input
        .parse::<MenuCategory>()
        .map(ChatRoute::Menu)
        .unwrap_or(ChatRoute::Agent)
}

/// Produces the answer text for one chat input.
pub async fn answer(state: &ServerState, input: &str) -> Result<String, AppError> {
    if let ChatRoute::Menu(category) = route(input) {
        info!("Menu fast path: {}", category);
        return Ok(state.menu.lookup(input).to_string());
    }

    let outcome = state.agent.invoke(input).await?;
    info!(
        output = %outcome.output,
        iterations = outcome.iterations,
        steps = ?outcome.intermediate_steps,
        "Agent full response"
    );

    outcome
        .final_answer()
        .map(str::to_string)
        .ok_or(AppError::NoValidAnswer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_categories_take_the_fast_path() {
        assert_eq!(route("breakfast"), ChatRoute::Menu(MenuCategory::Breakfast));
        assert_eq!(route("Lunch"), ChatRoute::Menu(MenuCategory::Lunch));
        assert_eq!(route("DINNER"), ChatRoute::Menu(MenuCategory::Dinner));
    }

    #[test]
    fn everything_else_goes_to_the_agent() {
        assert_eq!(route("brunch"), ChatRoute::Agent);
        assert_eq!(route(" lunch"), ChatRoute::Agent);
        assert_eq!(route("lunch?"), ChatRoute::Agent);
        assert_eq!(route("what's on the menu for lunch?"), ChatRoute::Agent);
        assert_eq!(route(""), ChatRoute::Agent);
    }
}
