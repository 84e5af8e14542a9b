use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}")]
    Status { status: u16, message: Option<String> },
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Screen context a failure is reported in. Each one has its own wording for
/// errors the backend did not classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Register,
    /// Fixed banner text, whatever the cause.
    Plain(&'static str),
    /// Prefer the `error`/`message` field the backend sent, else the text.
    Detailed(&'static str),
}

const INVALID_DATA: &str = "Dados inválidos. Verifique os campos e tente novamente.";
const BAD_CREDENTIALS: &str = "Email ou senha inválidos.";
const EMAIL_TAKEN: &str = "Email já cadastrado.";
const SERVER_ERROR: &str = "Erro interno no servidor. Tente novamente mais tarde.";

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message: Some(m), .. } if !m.trim().is_empty() => Some(m.as_str()),
            _ => None,
        }
    }

    /// Banner text shown inline on the page that issued the request.
    pub fn user_message(&self, op: Operation) -> String {
        match op {
            Operation::Login => match self.status() {
                Some(400) => INVALID_DATA.into(),
                Some(401) => BAD_CREDENTIALS.into(),
                Some(409) => EMAIL_TAKEN.into(),
                Some(500) => SERVER_ERROR.into(),
                _ => "Erro inesperado ao fazer login.".into(),
            },
            Operation::Register => match self.status() {
                Some(400) => INVALID_DATA.into(),
                Some(409) => EMAIL_TAKEN.into(),
                Some(500) => SERVER_ERROR.into(),
                _ => "Erro inesperado ao realizar cadastro.".into(),
            },
            Operation::Plain(text) => text.into(),
            Operation::Detailed(text) => self
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| text.into()),
        }
    }
}

/// Pulls `error` or `message` out of an error body, if the body is JSON.
pub(crate) fn message_from_body(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json.get("error")
        .or_else(|| json.get("message"))
        .or_else(|| json.get("mensagem"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ApiError {
        ApiError::Status { status: code, message: None }
    }

    #[test]
    fn login_messages_follow_status() {
        assert_eq!(status(400).user_message(Operation::Login), INVALID_DATA);
        assert_eq!(status(401).user_message(Operation::Login), BAD_CREDENTIALS);
        assert_eq!(status(409).user_message(Operation::Login), EMAIL_TAKEN);
        assert_eq!(status(500).user_message(Operation::Login), SERVER_ERROR);
        assert_eq!(
            status(418).user_message(Operation::Login),
            "Erro inesperado ao fazer login."
        );
    }

    #[test]
    fn register_has_no_credentials_message() {
        assert_eq!(
            status(401).user_message(Operation::Register),
            "Erro inesperado ao realizar cadastro."
        );
        assert_eq!(status(409).user_message(Operation::Register), EMAIL_TAKEN);
    }

    #[test]
    fn detailed_prefers_server_text() {
        let err = ApiError::Status {
            status: 400,
            message: Some("profissional já vinculado".into()),
        };
        assert_eq!(
            err.user_message(Operation::Detailed("Erro ao enviar convite")),
            "profissional já vinculado"
        );
        assert_eq!(
            status(400).user_message(Operation::Detailed("Erro ao enviar convite")),
            "Erro ao enviar convite"
        );
    }

    #[test]
    fn plain_ignores_server_text() {
        let err = ApiError::Status { status: 500, message: Some("panic".into()) };
        assert_eq!(
            err.user_message(Operation::Plain("Erro ao deletar.")),
            "Erro ao deletar."
        );
    }

    #[test]
    fn body_message_lookup() {
        assert_eq!(message_from_body(r#"{"error":"x"}"#).as_deref(), Some("x"));
        assert_eq!(message_from_body(r#"{"message":"y"}"#).as_deref(), Some("y"));
        assert_eq!(message_from_body("not json"), None);
    }
}
