use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserKind {
    #[serde(rename = "clientes")]
    Client,
    #[serde(rename = "profissionais")]
    Professional,
    #[serde(rename = "admin")]
    Admin,
    #[serde(other)]
    Unknown,
}

impl UserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserKind::Client => "clientes",
            UserKind::Professional => "profissionais",
            UserKind::Admin => "admin",
            UserKind::Unknown => "",
        }
    }

    /// Reads the stored `usuarioTipo` value; anything unrecognised is `Unknown`.
    pub fn from_tipo(tipo: &str) -> Self {
        match tipo {
            "clientes" => UserKind::Client,
            "profissionais" => UserKind::Professional,
            "admin" => UserKind::Admin,
            _ => UserKind::Unknown,
        }
    }
}

/// The logged-in user as returned by `/login`. Fields the client does not
/// know about are kept so profile updates send them back untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "unknown_kind")]
    pub tipo: UserKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagem_url: Option<String>,
    #[serde(default, rename = "fotoUrl", skip_serializing_if = "Option::is_none")]
    pub foto_url: Option<String>,
    #[serde(
        default,
        rename = "estabelecimentoId",
        alias = "estabelecimento_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub estabelecimento_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn unknown_kind() -> UserKind {
    UserKind::Unknown
}

impl SessionUser {
    pub fn photo(&self) -> Option<&str> {
        first_filled(&[self.imagem_url.as_deref(), self.foto_url.as_deref()])
    }

    pub fn has_establishment(&self) -> bool {
        self.estabelecimento_id.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub usuario: SessionUser,
    #[serde(default)]
    pub mensagem: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub senha: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub nome: String,
    pub email: String,
    pub senha: String,
    pub tipo: UserKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub mensagem: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, rename = "Endereco", alias = "endereco")]
    pub endereco: String,
    #[serde(default, rename = "Cidade", alias = "cidade")]
    pub cidade: String,
    #[serde(default, rename = "UF", alias = "uf")]
    pub uf: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Establishment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub descricao: String,
    #[serde(default, rename = "fotoURL", alias = "fotoUrl")]
    pub foto_url: String,
    #[serde(default)]
    pub categoria: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub localizacao: Location,
    #[serde(default, rename = "responsavelUid", alias = "responsavel_uid")]
    pub responsavel_uid: String,
    #[serde(default, rename = "criadoEm")]
    pub criado_em: Option<String>,
}

impl Establishment {
    pub fn city(&self) -> Option<&str> {
        let c = self.localizacao.cidade.trim();
        (!c.is_empty()).then_some(c)
    }
}

/// Body for creating or editing an establishment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EstablishmentPayload {
    pub nome: String,
    pub descricao: String,
    #[serde(rename = "fotoURL")]
    pub foto_url: String,
    pub categoria: String,
    pub localizacao: Location,
    pub responsavel_uid: String,
}

impl From<&Establishment> for EstablishmentPayload {
    fn from(e: &Establishment) -> Self {
        Self {
            nome: e.nome.clone(),
            descricao: e.descricao.clone(),
            foto_url: e.foto_url.clone(),
            categoria: e.categoria.clone(),
            localizacao: e.localizacao.clone(),
            responsavel_uid: e.responsavel_uid.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Professional {
    #[serde(default, alias = "UID")]
    pub id: String,
    #[serde(default, alias = "Nome")]
    pub nome: String,
    #[serde(default, rename = "fotoUrl")]
    pub foto_url: Option<String>,
    #[serde(default)]
    pub imagem_url: Option<String>,
    #[serde(default, rename = "FotoURL")]
    pub foto_url_upper: Option<String>,
    #[serde(default, rename = "estabelecimentoId", alias = "estabelecimento_id")]
    pub estabelecimento_id: Option<String>,
}

impl Professional {
    pub fn photo(&self) -> Option<&str> {
        first_filled(&[
            self.foto_url.as_deref(),
            self.imagem_url.as_deref(),
            self.foto_url_upper.as_deref(),
        ])
    }
}

/// A professional's link to an establishment, as listed by
/// `/estabelecimentos/{id}/profissionais`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstablishmentMember {
    #[serde(rename = "UID", alias = "uid")]
    pub uid: String,
    #[serde(default, rename = "Nome", alias = "nome")]
    pub nome: Option<String>,
    #[serde(default, rename = "Status", alias = "status")]
    pub status: String,
    #[serde(default, rename = "AdicionadoEm", alias = "adicionadoEm")]
    pub adicionado_em: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Procedure {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub preco: f64,
    #[serde(default)]
    pub duracao_min: u32,
    #[serde(default)]
    pub imagem_url: Option<String>,
    #[serde(default)]
    pub profissional_id: String,
}

impl Procedure {
    pub fn price_label(&self) -> String {
        format!("R${:.2}", self.preco)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedurePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub nome: String,
    pub descricao: String,
    pub preco: f64,
    pub duracao_min: u32,
    pub profissional_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Created {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUpdate<'a> {
    pub imagem_url: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AvailabilityRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub profissional_id: String,
    #[serde(default)]
    pub dia_semana: String,
    #[serde(default)]
    pub hora_inicio: String,
    #[serde(default)]
    pub hora_fim: String,
    #[serde(default)]
    pub disponivel: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRequest {
    pub profissional_id: String,
    pub dias_semana: Vec<String>,
    pub hora_inicio: String,
    pub hora_fim: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub criados: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ignorados: Vec<Value>,
}

impl ScheduleResult {
    pub fn summary(&self) -> String {
        format!(
            "Horários criados: {}, Ignorados: {}",
            self.criados.len(),
            self.ignorados.len()
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailableSlots {
    #[serde(default, deserialize_with = "null_as_default")]
    pub horarios: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub cliente_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cliente_nome: Option<String>,
    #[serde(default)]
    pub profissional_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estabelecimento_id: Option<String>,
    /// Procedure name, not an id.
    #[serde(default)]
    pub procedimento: String,
    #[serde(default)]
    pub data_hora: String,
}

impl Appointment {
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        self.starts_at_in(&Local)
    }

    pub fn starts_at_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.data_hora, tz)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAppointment {
    pub cliente_id: String,
    pub profissional_id: String,
    pub procedimento: String,
    pub data_hora: String,
    pub estabelecimento_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum InvitationStatus {
    #[default]
    #[serde(rename = "pendente", alias = "pending")]
    Pending,
    #[serde(rename = "aceito", alias = "accepted")]
    Accepted,
    #[serde(rename = "recusado", alias = "declined")]
    Declined,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Invitation {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "EstabelecimentoID", alias = "estabelecimento_id")]
    pub estabelecimento_id: Option<String>,
    #[serde(default)]
    pub profissional_id: Option<String>,
    #[serde(default, rename = "deNome")]
    pub de_nome: Option<String>,
    #[serde(default, rename = "deEmail")]
    pub de_email: Option<String>,
    #[serde(default)]
    pub mensagem: Option<String>,
    #[serde(default)]
    pub status: InvitationStatus,
}

impl Invitation {
    pub fn sender(&self) -> &str {
        first_filled(&[self.de_nome.as_deref(), self.de_email.as_deref()])
            .unwrap_or("Estabelecimento")
    }

    pub fn message(&self) -> &str {
        first_filled(&[self.mensagem.as_deref()])
            .unwrap_or("Convite para vincular-se a um estabelecimento.")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InvitationAnswer {
    #[serde(rename = "aceito")]
    Accept,
    #[serde(rename = "recusado")]
    Decline,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvitationReply<'a> {
    pub convite_id: &'a str,
    pub resposta: InvitationAnswer,
}

#[derive(Debug, Clone, Serialize)]
pub struct InviteRequest<'a> {
    pub profissional_uid: &'a str,
    pub estabelecimento_id: &'a str,
}

/// Parses the timestamps the backend emits: RFC 3339, or a naive
/// `YYYY-MM-DDTHH:MM:SS` read as wall-clock time in `tz`.
pub fn parse_timestamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())?;
    tz.from_local_datetime(&naive).earliest().map(|at| at.with_timezone(&Utc))
}

fn first_filled<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|s| !s.trim().is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::json;

    #[test]
    fn login_response_keeps_unknown_fields() {
        let resp: LoginResponse = serde_json::from_value(json!({
            "mensagem": "ok",
            "usuario": {"id": "u1", "tipo": "clientes", "nome": "Ana", "telefone": "123"}
        }))
        .unwrap();
        assert_eq!(resp.usuario.tipo, UserKind::Client);
        assert_eq!(resp.usuario.extra["telefone"], "123");
        let back = serde_json::to_value(&resp.usuario).unwrap();
        assert_eq!(back["telefone"], "123");
        assert_eq!(back["tipo"], "clientes");
    }

    #[test]
    fn user_kind_from_stored_tipo() {
        for kind in [UserKind::Client, UserKind::Professional, UserKind::Admin] {
            assert_eq!(UserKind::from_tipo(kind.as_str()), kind);
        }
        assert_eq!(UserKind::from_tipo("gerente"), UserKind::Unknown);
    }

    #[test]
    fn unknown_user_kind_does_not_fail() {
        let user: SessionUser =
            serde_json::from_value(json!({"id": "x", "tipo": "gerente"})).unwrap();
        assert_eq!(user.tipo, UserKind::Unknown);
    }

    #[test]
    fn user_photo_accepts_both_keys() {
        let user: SessionUser = serde_json::from_value(json!({
            "id": "p", "imagem_url": "", "fotoUrl": "http://img/p.png"
        }))
        .unwrap();
        assert_eq!(user.photo(), Some("http://img/p.png"));
    }

    #[test]
    fn establishment_reads_either_location_casing() {
        let upper: Establishment = serde_json::from_value(json!({
            "id": "e1", "nome": "Barbearia",
            "localizacao": {"Endereco": "Rua A", "Cidade": "Recife", "UF": "PE"},
            "responsavelUid": "adm"
        }))
        .unwrap();
        let lower: Establishment = serde_json::from_value(json!({
            "id": "e1", "nome": "Barbearia",
            "localizacao": {"endereco": "Rua A", "cidade": "Recife", "uf": "PE"},
            "responsavel_uid": "adm"
        }))
        .unwrap();
        assert_eq!(upper.localizacao, lower.localizacao);
        assert_eq!(upper.city(), Some("Recife"));
        assert_eq!(lower.responsavel_uid, "adm");
    }

    #[test]
    fn establishment_missing_fields_default_to_empty() {
        let est: Establishment =
            serde_json::from_value(json!({"id": "e2", "localizacao": null})).unwrap();
        assert_eq!(est.nome, "");
        assert_eq!(est.city(), None);
    }

    #[test]
    fn establishment_payload_uses_backend_names() {
        let payload = EstablishmentPayload {
            nome: "Studio".into(),
            localizacao: Location { cidade: "Natal".into(), uf: "RN".into(), ..Default::default() },
            responsavel_uid: "adm".into(),
            ..Default::default()
        };
        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["localizacao"]["Cidade"], "Natal");
        assert_eq!(v["responsavel_uid"], "adm");
        assert!(v.get("fotoURL").is_some());
    }

    #[test]
    fn professional_member_casings() {
        let p: Professional =
            serde_json::from_value(json!({"UID": "p1", "Nome": "Rui", "FotoURL": "f"})).unwrap();
        assert_eq!(p.id, "p1");
        assert_eq!(p.nome, "Rui");
        assert_eq!(p.photo(), Some("f"));

        let m: EstablishmentMember = serde_json::from_value(json!({
            "UID": "p1", "Status": "ativo", "AdicionadoEm": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(m.uid, "p1");
        assert!(m.nome.is_none());
    }

    #[test]
    fn price_label_has_two_decimals() {
        let p = Procedure { preco: 35.5, ..Default::default() };
        assert_eq!(p.price_label(), "R$35.50");
    }

    #[test]
    fn invitation_fallback_texts() {
        let inv: Invitation = serde_json::from_value(json!({"id": "c1"})).unwrap();
        assert_eq!(inv.sender(), "Estabelecimento");
        assert_eq!(inv.message(), "Convite para vincular-se a um estabelecimento.");
        assert_eq!(inv.status, InvitationStatus::Pending);

        let inv: Invitation = serde_json::from_value(json!({
            "id": "c2", "deEmail": "dono@ex.com", "status": "aceito", "EstabelecimentoID": "e9"
        }))
        .unwrap();
        assert_eq!(inv.sender(), "dono@ex.com");
        assert_eq!(inv.status, InvitationStatus::Accepted);
        assert_eq!(inv.estabelecimento_id.as_deref(), Some("e9"));
    }

    #[test]
    fn schedule_result_tolerates_null_lists() {
        let r: ScheduleResult =
            serde_json::from_value(json!({"criados": [{"id": 1}], "ignorados": null})).unwrap();
        assert_eq!(r.summary(), "Horários criados: 1, Ignorados: 0");
    }

    #[test]
    fn timestamps_with_and_without_offset() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let a = parse_timestamp("2025-03-10T12:00:00-03:00", &Utc).unwrap();
        let b = parse_timestamp("2025-03-10T15:00:00Z", &brt).unwrap();
        assert_eq!(a, b);
        assert_eq!(parse_timestamp("2025-03-10T15:00:00", &Utc), Some(b));
        assert_eq!(parse_timestamp("amanhã", &Utc), None);
    }

    #[test]
    fn zoneless_timestamp_is_wall_clock_in_given_zone() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let at = parse_timestamp("2025-03-10T01:30:00", &brt).unwrap();
        assert_eq!(at, "2025-03-10T04:30:00Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(parse_timestamp("2025-03-10 01:30:00", &brt), Some(at));
    }
}
