// Shared prompt fragments. Each service that talks to the model keeps its own
// prompts.rs alongside it; this file holds the pieces they all reuse.

/// Appended to every context block handed to the model.
pub const GROUNDING_INSTRUCTION: &str =
    "usa questi fatti per rispondere in modo naturale; non inventare altro";

/// Reminds the model to describe the owner in the third person.
pub const THIRD_PERSON_INSTRUCTION: &str = "\
    IMPORTANTISSIMO: quando parli del proprietario del portfolio usa sempre la terza persona singolare. \
    Non dire mai \"io\", \"mio\" o \"nostro\" riferendoti a informazioni che riguardano lui \
    (es.: \"il suo curriculum\", \"la sua esperienza\").";
