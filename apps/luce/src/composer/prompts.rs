// Prompt text and canned replies for the Answer Composer.
// Cross-cutting fragments live in llm_client::prompts.

use crate::knowledge::{DocKind, Project};
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, THIRD_PERSON_INSTRUCTION};

/// Persona and tone. Sent as the first system message of every request.
pub fn system_prompt(owner: &str) -> String {
    format!(
        "Ti chiami Luce e sei l'assistente virtuale del portfolio di {owner}.\n\
        Parla in italiano con un tono caldo, professionale e cordiale: evita frasi meccaniche \
        e aggiungi piccole sfumature empatiche senza essere prolissa.\n\
        Usa i dati forniti per formulare risposte naturali: riassumi, riformula e proponi follow-up utili.\n\n\
        {THIRD_PERSON_INSTRUCTION}\n\
        Usa la prima persona solo quando descrivi quello che fai tu (Luce), \
        es.: \"Posso guidarti tra i progetti\", \"Posso inviarti il suo CV\".\n\n\
        Se la domanda è ambigua o troppo generale, poni una domanda di chiarimento breve \
        (es.: \"Intendi la biografia, i progetti o il CV?\").\n\
        Se manca l'informazione richiesta, dillo onestamente e suggerisci alternative.\n\
        Rifiuta gentilmente richieste non pertinenti al portfolio. \
        Mantieni le risposte concise salvo richiesta esplicita di approfondimento o valutazione."
    )
}

pub fn project_header() -> String {
    format!("Dati progetto ({GROUNDING_INSTRUCTION}):")
}

pub const PROJECT_INSTRUCTIONS: &str = "Istruzioni: se la domanda richiede dettagli non presenti qui, \
    dillo e chiedi cosa l'utente vuole sapere esattamente \
    (es.: \"Vuoi sapere le tecnologie usate o lo scopo del progetto?\").";

pub fn about_header() -> String {
    format!("Dati personali disponibili ({GROUNDING_INSTRUCTION}):")
}

pub const ABOUT_INSTRUCTIONS: &str = "Istruzioni: se l'utente chiede \"cosa sai dirmi su di lui\", \
    usa il riassunto e proponi opzioni: biografia breve, dettagli scolastici, elenco progetti o scaricare il CV. \
    Se l'informazione richiesta non è presente, dillo e suggerisci il percorso alternativo.";

pub const PROJECTS_LIST_HEADER: &str = "Progetti disponibili (usa l'elenco solo per orientare la risposta):";

pub const PROJECTS_LIST_INSTRUCTIONS: &str = "Istruzioni: cita solo le tecnologie presenti nell'elenco dei moduli \
    di ciascun progetto e non inventarne altre. Suggerisci possibili follow-up \
    (es.: \"Vuoi informazioni su uno di questi progetti in particolare?\").";

pub const UNKNOWN_INSTRUCTIONS: &str = "Non sono stati forniti dati strutturati. \
    Non rispondere per ipotesi: poni una breve domanda di chiarimento oppure suggerisci opzioni utili \
    (biografia, lista progetti, scaricare il CV).";

pub fn document_header(kind: DocKind, project: &Project) -> String {
    format!(
        "Estratto del documento {} del progetto \"{}\" ({GROUNDING_INSTRUCTION}):",
        kind.display_name(),
        project.name
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Canned replies
// ────────────────────────────────────────────────────────────────────────────

pub const EMPTY_PROMPT_REPLY: &str = "Dimmi pure, sono qui per aiutarti!";

pub const CV_OFFER: &str =
    "Posso fornirti il suo curriculum. Premi il pulsante per scaricarlo o visualizzarlo.";

pub const TIMEOUT_REPLY: &str =
    "Mi dispiace, la risposta sta impiegando troppo tempo. Riprova tra qualche istante.";

pub const TECHNICAL_ERROR_REPLY: &str = "Mi dispiace, c'è stato un problema tecnico nel generare la risposta. \
    Prova a riformulare o chiedi la lista dei progetti.";

pub const DOC_DECLINED_REPLY: &str =
    "Ricevuto, non consulterò quei documenti. Dimmi pure se ti serve altro.";

pub fn owner_clarification(owner: &str) -> String {
    format!(
        "Vuoi informazioni sull'autore del portfolio ({owner})? Posso mostrarti la biografia, \
        i dettagli scolastici, l'elenco dei progetti o il CV. Cosa preferisci?"
    )
}

pub const TECH_CLARIFICATION: &str =
    "Vuoi conoscere le tecnologie di un progetto in particolare o una panoramica di tutti i progetti?";

pub const VAGUE_CLARIFICATION: &str =
    "Posso aiutarti con la biografia, i progetti o il CV. Quale preferisci che approfondisca?";

/// Asks whether to read the named documents before answering.
pub fn doc_confirm_question(project: &Project, docs: &[DocKind], downloadable: bool) -> String {
    let names: Vec<&str> = docs.iter().map(DocKind::display_name).collect();
    let extra = if downloadable {
        " Puoi anche scaricarlo con il pulsante qui sotto."
    } else {
        ""
    };
    format!(
        "Vuoi che consulti {} del progetto \"{}\" prima di risponderti?{extra}",
        names.join(" e "),
        project.name
    )
}

pub fn suggestion_line(labels: &[&str]) -> String {
    format!("Posso anche parlarti di: {}.", labels.join(" o "))
}
