use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::api::error::{message_from_body, ApiError};
use crate::api::models::{
    Appointment, AvailabilityRule, AvailableSlots, Created, Establishment, EstablishmentMember,
    EstablishmentPayload, ImageUpdate, Invitation, InvitationAnswer, InvitationReply,
    InviteRequest, LoginRequest, LoginResponse, MessageResponse, NewAppointment, Procedure,
    ProcedurePayload, Professional, RegisterRequest, ScheduleRequest, ScheduleResult, UserKind,
};
use crate::app::AppConfig;

/// HTTP client for the ServiFlex backend. Cheap to clone; every page shares
/// the same connection pool.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    base: Url,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        Self::with_base_url(&config.api_url, Duration::from_secs(config.request_timeout_secs))
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url.trim_end_matches('/'))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        log::warn!("backend answered HTTP {status}: {body}");
        Err(ApiError::Status {
            status: status.as_u16(),
            message: message_from_body(&body),
        })
    }

    async fn json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ApiError> {
        let resp = Self::send(req).await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Lists may come back as a bare array, `null`, an empty body or wrapped
    /// in `{"data": [...]}`.
    async fn list<T: DeserializeOwned>(req: RequestBuilder) -> Result<Vec<T>, ApiError> {
        let resp = Self::send(req).await?;
        let bytes = resp.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let json: Value =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))?;
        let items = match json {
            Value::Null => return Ok(Vec::new()),
            Value::Array(items) => Value::Array(items),
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Null) | None => return Ok(Vec::new()),
                Some(inner) => inner,
            },
            other => return Err(ApiError::Decode(format!("expected a list, got {other}"))),
        };
        serde_json::from_value(items).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn unit(req: RequestBuilder) -> Result<(), ApiError> {
        Self::send(req).await.map(|_| ())
    }

    // auth

    pub async fn login(&self, email: &str, senha: &str) -> Result<LoginResponse, ApiError> {
        log::debug!("POST /login for {email}");
        let req = self.http.post(self.url(&["login"])).json(&LoginRequest { email, senha });
        Self::json(req).await
    }

    pub async fn register(&self, body: &RegisterRequest) -> Result<String, ApiError> {
        let req = self.http.post(self.url(&["cadastro"])).json(body);
        let resp: MessageResponse = Self::json(req).await?;
        Ok(resp.mensagem)
    }

    // users

    pub async fn update_user(&self, id: &str, kind: UserKind, body: &Value) -> Result<(), ApiError> {
        let mut url = self.url(&["usuarios", id]);
        url.query_pairs_mut().append_pair("tipo", kind.as_str());
        Self::unit(self.http.put(url).json(body)).await
    }

    pub async fn upload_professional_photo(&self, id: &str, imagem_url: &str) -> Result<(), ApiError> {
        let req = self
            .http
            .put(self.url(&["upload", "profissional", id]))
            .json(&ImageUpdate { imagem_url });
        Self::unit(req).await
    }

    // establishments

    pub async fn establishments(&self) -> Result<Vec<Establishment>, ApiError> {
        Self::list(self.http.get(self.url(&["estabelecimentos"]))).await
    }

    pub async fn establishment(&self, id: &str) -> Result<Establishment, ApiError> {
        Self::json(self.http.get(self.url(&["estabelecimentos", id]))).await
    }

    pub async fn create_establishment(&self, body: &EstablishmentPayload) -> Result<(), ApiError> {
        log::info!("creating establishment {:?}", body.nome);
        Self::unit(self.http.post(self.url(&["estabelecimentos"])).json(body)).await
    }

    pub async fn update_establishment(&self, id: &str, body: &EstablishmentPayload) -> Result<(), ApiError> {
        log::info!("updating establishment {id}");
        Self::unit(self.http.put(self.url(&["estabelecimentos", id])).json(body)).await
    }

    pub async fn establishment_members(&self, id: &str) -> Result<Vec<EstablishmentMember>, ApiError> {
        Self::list(self.http.get(self.url(&["estabelecimentos", id, "profissionais"]))).await
    }

    pub async fn remove_member(&self, establishment_id: &str, professional_id: &str) -> Result<(), ApiError> {
        let url = self.url(&["estabelecimentos", establishment_id, "profissionais", professional_id]);
        Self::unit(self.http.delete(url)).await
    }

    pub async fn invite_professional(&self, establishment_id: &str, professional_uid: &str) -> Result<(), ApiError> {
        let body = InviteRequest {
            profissional_uid: professional_uid,
            estabelecimento_id: establishment_id,
        };
        let url = self.url(&["estabelecimentos", "profissionais", "convidar"]);
        Self::unit(self.http.post(url).json(&body)).await
    }

    pub async fn answer_invitation(&self, id: &str, answer: InvitationAnswer) -> Result<(), ApiError> {
        let url = self.url(&["estabelecimentos", "profissionais", "notificacao", id]);
        let body = InvitationReply { convite_id: id, resposta: answer };
        Self::unit(self.http.post(url).json(&body)).await
    }

    // professionals

    pub async fn professionals(&self) -> Result<Vec<Professional>, ApiError> {
        Self::list(self.http.get(self.url(&["profissionais"]))).await
    }

    pub async fn professional(&self, id: &str) -> Result<Professional, ApiError> {
        Self::json(self.http.get(self.url(&["profissionais", id]))).await
    }

    pub async fn pending_invitations(&self, professional_id: &str) -> Result<Vec<Invitation>, ApiError> {
        let url = self.url(&["profissionais", professional_id, "convites-pendentes"]);
        Self::list(self.http.get(url)).await
    }

    /// Collision-aware slots for one day, computed by the backend.
    pub async fn available_slots(
        &self,
        professional_id: &str,
        date: NaiveDate,
        procedure_id: &str,
    ) -> Result<Vec<String>, ApiError> {
        let mut url = self.url(&["profissionais", professional_id, "horarios-disponiveis"]);
        url.query_pairs_mut()
            .append_pair("data", &date.format("%Y-%m-%d").to_string())
            .append_pair("procedimento_id", procedure_id);
        let slots: AvailableSlots = Self::json(self.http.get(url)).await?;
        Ok(slots.horarios)
    }

    // procedures

    pub async fn procedures(&self, professional_id: &str) -> Result<Vec<Procedure>, ApiError> {
        Self::list(self.http.get(self.url(&["procedimentos", professional_id]))).await
    }

    /// Returns the id the backend assigned.
    pub async fn create_procedure(&self, body: &ProcedurePayload) -> Result<String, ApiError> {
        let created: Created = Self::json(self.http.post(self.url(&["procedimentos"])).json(body)).await?;
        Ok(created.id)
    }

    pub async fn update_procedure(&self, id: &str, body: &ProcedurePayload) -> Result<(), ApiError> {
        Self::unit(self.http.put(self.url(&["procedimentos", id])).json(body)).await
    }

    pub async fn delete_procedure(&self, id: &str) -> Result<(), ApiError> {
        Self::unit(self.http.delete(self.url(&["procedimentos", id]))).await
    }

    pub async fn upload_procedure_photo(&self, id: &str, imagem_url: &str) -> Result<(), ApiError> {
        let req = self
            .http
            .put(self.url(&["upload", "procedimento", id]))
            .json(&ImageUpdate { imagem_url });
        Self::unit(req).await
    }

    // weekly availability

    pub async fn availability(&self, professional_id: &str) -> Result<Vec<AvailabilityRule>, ApiError> {
        Self::list(self.http.get(self.url(&["horarios", professional_id]))).await
    }

    pub async fn create_availability(&self, body: &ScheduleRequest) -> Result<ScheduleResult, ApiError> {
        Self::json(self.http.post(self.url(&["horarios"])).json(body)).await
    }

    // appointments

    pub async fn client_appointments(&self, client_id: &str) -> Result<Vec<Appointment>, ApiError> {
        Self::list(self.http.get(self.url(&["agendamentos", "cliente", client_id]))).await
    }

    pub async fn professional_appointments(&self, professional_id: &str) -> Result<Vec<Appointment>, ApiError> {
        Self::list(self.http.get(self.url(&["agendamentos", "profissional", professional_id]))).await
    }

    pub async fn create_appointment(&self, body: &NewAppointment) -> Result<(), ApiError> {
        log::info!("booking {} with {} at {}", body.procedimento, body.profissional_id, body.data_hora);
        Self::unit(self.http.post(self.url(&["agendamentos"])).json(body)).await
    }

    pub async fn update_appointment(&self, appointment: &Appointment) -> Result<(), ApiError> {
        let url = self.url(&["agendamentos", &appointment.id]);
        Self::unit(self.http.put(url).json(appointment)).await
    }

    pub async fn cancel_appointment(&self, id: &str) -> Result<(), ApiError> {
        log::info!("cancelling appointment {id}");
        Self::unit(self.http.delete(self.url(&["agendamentos", id]))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::{get, post, put};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn serve(router: Router) -> ApiClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        ApiClient::with_base_url(&format!("http://{addr}/"), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn login_returns_user() {
        let router = Router::new().route(
            "/login",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["email"], "ana@ex.com");
                assert_eq!(body["senha"], "segredo");
                Json(json!({
                    "mensagem": "Login realizado",
                    "usuario": {"id": "u1", "tipo": "clientes", "nome": "Ana"}
                }))
            }),
        );
        let client = serve(router).await;
        let resp = client.login("ana@ex.com", "segredo").await.unwrap();
        assert_eq!(resp.usuario.id, "u1");
        assert_eq!(resp.usuario.tipo, UserKind::Client);
        assert_eq!(resp.mensagem, "Login realizado");
    }

    #[tokio::test]
    async fn login_failure_keeps_status() {
        let router = Router::new().route(
            "/login",
            post(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"error": "credenciais"}))) }),
        );
        let client = serve(router).await;
        let err = client.login("a", "b").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.server_message(), Some("credenciais"));
    }

    #[tokio::test]
    async fn lists_accept_null_and_wrapped_bodies() {
        let router = Router::new()
            .route("/estabelecimentos", get(|| async { Json(Value::Null) }))
            .route(
                "/profissionais",
                get(|| async { Json(json!({"data": [{"id": "p1", "nome": "Rui"}]})) }),
            );
        let client = serve(router).await;
        assert!(client.establishments().await.unwrap().is_empty());
        let pros = client.professionals().await.unwrap();
        assert_eq!(pros.len(), 1);
        assert_eq!(pros[0].nome, "Rui");
    }

    #[tokio::test]
    async fn available_slots_sends_date_and_procedure() {
        let router = Router::new().route(
            "/profissionais/:id/horarios-disponiveis",
            get(|Path(id): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(id, "p1");
                assert_eq!(q["data"], "2025-03-10");
                assert_eq!(q["procedimento_id"], "proc9");
                Json(json!({"horarios": ["09:00", "09:30"]}))
            }),
        );
        let client = serve(router).await;
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let slots = client.available_slots("p1", date, "proc9").await.unwrap();
        assert_eq!(slots, vec!["09:00", "09:30"]);
    }

    #[tokio::test]
    async fn create_procedure_returns_new_id() {
        let router = Router::new().route(
            "/procedimentos",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["duracao_min"], 45);
                assert!(body.get("id").is_none());
                (StatusCode::CREATED, Json(json!({"id": "novo"})))
            }),
        );
        let client = serve(router).await;
        let id = client
            .create_procedure(&ProcedurePayload {
                id: None,
                nome: "Corte".into(),
                descricao: "Corte masculino".into(),
                preco: 40.0,
                duracao_min: 45,
                profissional_id: "p1".into(),
            })
            .await
            .unwrap();
        assert_eq!(id, "novo");
    }

    #[tokio::test]
    async fn update_user_passes_kind_query() {
        let router = Router::new().route(
            "/usuarios/:id",
            put(|Path(id): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(id, "u1");
                assert_eq!(q["tipo"], "profissionais");
                StatusCode::OK
            }),
        );
        let client = serve(router).await;
        client
            .update_user("u1", UserKind::Professional, &json!({"nome": "Rui"}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn answer_invitation_posts_reply() {
        let router = Router::new().route(
            "/estabelecimentos/profissionais/notificacao/:id",
            post(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                assert_eq!(body["convite_id"], id);
                assert_eq!(body["resposta"], "recusado");
                StatusCode::NO_CONTENT
            }),
        );
        let client = serve(router).await;
        client.answer_invitation("c7", InvitationAnswer::Decline).await.unwrap();
    }

    #[test]
    fn base_path_is_preserved() {
        let client = ApiClient::with_base_url("http://localhost:8080/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.url(&["agendamentos", "cliente", "u 1"]).as_str(),
            "http://localhost:8080/api/agendamentos/cliente/u%201"
        );
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(ApiClient::with_base_url("mailto:a@b", Duration::from_secs(1)).is_err());
        assert!(ApiClient::with_base_url("not a url", Duration::from_secs(1)).is_err());
    }
}
