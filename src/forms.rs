//! Client-side validation, run before any request leaves the client.

use serde_json::Value;
use thiserror::Error;

use crate::api::models::{
    EstablishmentPayload, Location, ProcedurePayload, RegisterRequest, ScheduleRequest, SessionUser,
    UserKind,
};
use crate::slots::parse_time;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Preencha o campo obrigatório: {0}.")]
    Required(&'static str),
    #[error("Preencha todos os campos antes de adicionar.")]
    Incomplete,
    #[error("Valor inválido para {0}.")]
    InvalidNumber(&'static str),
    #[error("Horário inválido: {0}.")]
    InvalidTime(String),
    #[error("O horário final deve ser depois do inicial.")]
    EndBeforeStart,
    #[error("Selecione pelo menos um dia da semana.")]
    NoDays,
    #[error("ID do profissional é obrigatório.")]
    MissingProfessionalId,
}

fn required(value: &str, field: &'static str) -> Result<String, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FormError::Required(field))
    } else {
        Ok(trimmed.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub senha: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FormError> {
        required(&self.email, "email")?;
        if self.senha.is_empty() {
            return Err(FormError::Required("senha"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub nome: String,
    pub email: String,
    pub senha: String,
    pub tipo: UserKind,
}

impl RegisterForm {
    pub fn into_request(self) -> Result<RegisterRequest, FormError> {
        let nome = required(&self.nome, "nome")?;
        let email = required(&self.email, "email")?;
        if self.senha.is_empty() {
            return Err(FormError::Required("senha"));
        }
        Ok(RegisterRequest { nome, email, senha: self.senha, tipo: self.tipo })
    }
}

/// Text fields of the add/edit procedure form.
#[derive(Debug, Clone, Default)]
pub struct ProcedureForm {
    pub nome: String,
    pub descricao: String,
    pub preco: String,
    pub duracao: String,
    pub imagem_url: String,
}

impl ProcedureForm {
    pub fn to_payload(&self, id: Option<&str>, professional_id: &str) -> Result<ProcedurePayload, FormError> {
        if [&self.nome, &self.descricao, &self.preco, &self.duracao]
            .iter()
            .any(|f| f.trim().is_empty())
        {
            return Err(FormError::Incomplete);
        }
        let preco: f64 = self
            .preco
            .trim()
            .replace(',', ".")
            .parse()
            .map_err(|_| FormError::InvalidNumber("preço"))?;
        if !preco.is_finite() || preco < 0.0 {
            return Err(FormError::InvalidNumber("preço"));
        }
        let duracao_min: u32 = self
            .duracao
            .trim()
            .parse()
            .map_err(|_| FormError::InvalidNumber("duração"))?;
        Ok(ProcedurePayload {
            id: id.map(str::to_string),
            nome: self.nome.trim().to_string(),
            descricao: self.descricao.trim().to_string(),
            preco,
            duracao_min,
            profissional_id: professional_id.to_string(),
        })
    }

    /// Image URL to upload after saving, if one was typed.
    pub fn image(&self) -> Option<&str> {
        let url = self.imagem_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleForm {
    pub dias: Vec<String>,
    pub hora_inicio: String,
    pub hora_fim: String,
}

impl ScheduleForm {
    pub fn toggle_day(&mut self, day: &str) {
        if let Some(pos) = self.dias.iter().position(|d| d == day) {
            self.dias.remove(pos);
        } else {
            self.dias.push(day.to_string());
        }
    }

    /// Back to an empty form after a successful save.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_request(&self, professional_id: &str) -> Result<ScheduleRequest, FormError> {
        if self.dias.is_empty() {
            return Err(FormError::NoDays);
        }
        let start = parse_time(&self.hora_inicio)
            .ok_or_else(|| FormError::InvalidTime(self.hora_inicio.clone()))?;
        let end = parse_time(&self.hora_fim).ok_or_else(|| FormError::InvalidTime(self.hora_fim.clone()))?;
        if end <= start {
            return Err(FormError::EndBeforeStart);
        }
        Ok(ScheduleRequest {
            profissional_id: professional_id.to_string(),
            dias_semana: self.dias.clone(),
            hora_inicio: start.format("%H:%M").to_string(),
            hora_fim: end.format("%H:%M").to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct EstablishmentForm {
    pub nome: String,
    pub descricao: String,
    pub foto_url: String,
    pub categoria: String,
    pub endereco: String,
    pub cidade: String,
    pub uf: String,
}

impl EstablishmentForm {
    pub fn from_payload(p: &EstablishmentPayload) -> Self {
        Self {
            nome: p.nome.clone(),
            descricao: p.descricao.clone(),
            foto_url: p.foto_url.clone(),
            categoria: p.categoria.clone(),
            endereco: p.localizacao.endereco.clone(),
            cidade: p.localizacao.cidade.clone(),
            uf: p.localizacao.uf.clone(),
        }
    }

    /// Builds the request body; the owner is always the logged-in user.
    pub fn to_payload(&self, owner_id: &str) -> Result<EstablishmentPayload, FormError> {
        let nome = required(&self.nome, "nome")?;
        let categoria = required(&self.categoria, "categoria")?;
        let cidade = required(&self.cidade, "cidade")?;
        let uf = required(&self.uf, "UF")?.to_uppercase();
        Ok(EstablishmentPayload {
            nome,
            descricao: self.descricao.trim().to_string(),
            foto_url: self.foto_url.trim().to_string(),
            categoria,
            localizacao: Location { endereco: self.endereco.trim().to_string(), cidade, uf },
            responsavel_uid: owner_id.to_string(),
        })
    }
}

pub fn validate_invite(professional_id: &str) -> Result<String, FormError> {
    let id = professional_id.trim();
    if id.is_empty() {
        Err(FormError::MissingProfessionalId)
    } else {
        Ok(id.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub nome: String,
    pub email: String,
    pub senha: String,
    pub imagem_url: String,
}

impl ProfileForm {
    pub fn from_user(user: &SessionUser) -> Self {
        Self {
            nome: user.nome.clone(),
            email: user.email.clone(),
            senha: String::new(),
            imagem_url: user.photo().unwrap_or_default().to_string(),
        }
    }

    /// Body for `PUT /usuarios/{id}`: the stored user with the edited name
    /// and email; the password only when one was typed.
    pub fn to_body(&self, user: &SessionUser) -> Result<Value, FormError> {
        let nome = required(&self.nome, "nome")?;
        let email = required(&self.email, "email")?;
        let mut body = serde_json::to_value(user).unwrap_or_else(|_| Value::Object(Default::default()));
        if let Value::Object(map) = &mut body {
            map.insert("nome".into(), Value::String(nome));
            map.insert("email".into(), Value::String(email));
            if !self.senha.is_empty() {
                map.insert("senha".into(), Value::String(self.senha.clone()));
            }
        }
        Ok(body)
    }

    /// New photo URL, when it differs from the stored one.
    pub fn changed_image<'a>(&'a self, user: &SessionUser) -> Option<&'a str> {
        let url = self.imagem_url.trim();
        (!url.is_empty() && Some(url) != user.photo()).then_some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_requires_both_fields() {
        let form = LoginForm { email: " ".into(), senha: "x".into() };
        assert_eq!(form.validate(), Err(FormError::Required("email")));
        let form = LoginForm { email: "a@b".into(), senha: String::new() };
        assert_eq!(form.validate(), Err(FormError::Required("senha")));
    }

    #[test]
    fn register_trims_and_keeps_kind() {
        let req = RegisterForm {
            nome: " Ana ".into(),
            email: "ana@ex.com".into(),
            senha: "123".into(),
            tipo: UserKind::Professional,
        }
        .into_request()
        .unwrap();
        assert_eq!(req.nome, "Ana");
        assert_eq!(req.tipo, UserKind::Professional);
    }

    #[test]
    fn procedure_form_rejects_blank_fields() {
        let form = ProcedureForm { nome: "Corte".into(), preco: "30".into(), ..Default::default() };
        assert_eq!(form.to_payload(None, "p1"), Err(FormError::Incomplete));
        assert_eq!(FormError::Incomplete.to_string(), "Preencha todos os campos antes de adicionar.");
    }

    #[test]
    fn procedure_form_parses_numbers() {
        let form = ProcedureForm {
            nome: "Corte".into(),
            descricao: "Tesoura".into(),
            preco: "35,50".into(),
            duracao: "40".into(),
            imagem_url: " ".into(),
        };
        let payload = form.to_payload(Some("proc1"), "p1").unwrap();
        assert_eq!(payload.preco, 35.5);
        assert_eq!(payload.duracao_min, 40);
        assert_eq!(payload.id.as_deref(), Some("proc1"));
        assert_eq!(form.image(), None);

        let bad = ProcedureForm { duracao: "meia hora".into(), ..form };
        assert_eq!(bad.to_payload(None, "p1"), Err(FormError::InvalidNumber("duração")));
    }

    #[test]
    fn schedule_form_reset_blocks_resubmit() {
        let mut form = ScheduleForm { hora_inicio: "09:00".into(), hora_fim: "12:00".into(), ..Default::default() };
        form.toggle_day("Segunda");
        assert!(form.to_request("p1").is_ok());
        form.reset();
        assert!(form.dias.is_empty());
        assert!(form.hora_inicio.is_empty() && form.hora_fim.is_empty());
        assert_eq!(form.to_request("p1"), Err(FormError::NoDays));
    }

    #[test]
    fn schedule_form_checks_days_and_order() {
        let mut form = ScheduleForm { hora_inicio: "09:00".into(), hora_fim: "18:00".into(), ..Default::default() };
        assert_eq!(form.to_request("p1"), Err(FormError::NoDays));
        form.toggle_day("Segunda");
        form.toggle_day("Terça");
        form.toggle_day("Segunda");
        let req = form.to_request("p1").unwrap();
        assert_eq!(req.dias_semana, vec!["Terça"]);
        form.hora_fim = "08:00".into();
        assert_eq!(form.to_request("p1"), Err(FormError::EndBeforeStart));
        form.hora_fim = "18h".into();
        assert_eq!(form.to_request("p1"), Err(FormError::InvalidTime("18h".into())));
    }

    #[test]
    fn establishment_form_requires_core_fields() {
        let form = EstablishmentForm { nome: "Studio".into(), categoria: "Beleza".into(), ..Default::default() };
        assert_eq!(form.to_payload("adm"), Err(FormError::Required("cidade")));
        let form = EstablishmentForm { cidade: "Natal".into(), uf: "rn".into(), ..form };
        let payload = form.to_payload("adm").unwrap();
        assert_eq!(payload.localizacao.uf, "RN");
        assert_eq!(payload.responsavel_uid, "adm");
        assert_eq!(EstablishmentForm::from_payload(&payload).cidade, "Natal");
    }

    #[test]
    fn invite_needs_an_id() {
        assert_eq!(validate_invite("  "), Err(FormError::MissingProfessionalId));
        assert_eq!(validate_invite(" p9 ").unwrap(), "p9");
    }

    #[test]
    fn profile_body_only_sends_password_when_typed() {
        let user: SessionUser = serde_json::from_value(json!({
            "id": "u1", "tipo": "clientes", "nome": "Ana", "email": "a@ex.com", "telefone": "9"
        }))
        .unwrap();
        let mut form = ProfileForm::from_user(&user);
        form.nome = "Ana Lima".into();
        let body = form.to_body(&user).unwrap();
        assert_eq!(body["nome"], "Ana Lima");
        assert_eq!(body["telefone"], "9");
        assert!(body.get("senha").is_none());
        form.senha = "nova".into();
        assert_eq!(form.to_body(&user).unwrap()["senha"], "nova");
        form.nome.clear();
        assert_eq!(form.to_body(&user), Err(FormError::Required("nome")));
    }

    #[test]
    fn profile_image_change_detection() {
        let user: SessionUser =
            serde_json::from_value(json!({"id": "u1", "imagem_url": "http://a"})).unwrap();
        let mut form = ProfileForm::from_user(&user);
        assert_eq!(form.changed_image(&user), None);
        form.imagem_url = "http://b".into();
        assert_eq!(form.changed_image(&user), Some("http://b"));
    }
}
