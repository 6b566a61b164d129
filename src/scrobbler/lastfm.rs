// Last.fm scrobbler implementation
// API Documentation: https://www.last.fm/api/scrobbling

use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;

use super::error::ScrobbleError;
use super::signature::sign;
use super::traits::{Report, ReportResult, Scrobbler, SkipReason};
use super::transport::{HttpResponse, HttpTransport, Transport};
use crate::settings::{SettingKey, SettingsStore};
use crate::track::TrackIdentity;

/// Application-level error payload, e.g. `{"error": 9, "message": "Invalid session key"}`
#[derive(Debug, Deserialize)]
struct ApiError {
    error: u32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session: Session,
}

#[derive(Debug, Deserialize)]
struct Session {
    key: String,
}

pub struct LastFmClient<T = HttpTransport> {
    transport: T,
    api_url: String,
    enabled: bool,
}

impl<T: Transport> LastFmClient<T> {
    pub fn new(transport: T, api_url: impl Into<String>, enabled: bool) -> Self {
        Self {
            transport,
            api_url: api_url.into(),
            enabled,
        }
    }

    fn require(settings: &dyn SettingsStore, key: SettingKey) -> Result<String, SettingKey> {
        settings.get(key).ok_or(key)
    }

    /// Add `api_sig` and `format=json` to a parameter set
    fn signed(mut params: BTreeMap<&'static str, String>, secret: &str) -> Vec<(String, String)> {
        let signature = sign(&params, secret);
        params.insert("api_sig", signature);
        params.insert("format", "json".to_string());
        params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    /// Turn an error payload or a non-2xx status into an error, otherwise return the body
    fn check(response: HttpResponse) -> Result<String, ScrobbleError> {
        if let Ok(api_error) = serde_json::from_str::<ApiError>(&response.body) {
            return Err(ScrobbleError::Api {
                code: api_error.error,
                message: api_error.message,
            });
        }

        if !response.is_success() {
            return Err(ScrobbleError::Http {
                status: response.status,
                body: response.body,
            });
        }

        Ok(response.body)
    }

    /// Signed, session-authenticated POST shared by now playing and scrobble
    fn submit(
        &self,
        settings: &dyn SettingsStore,
        method: &str,
        track: &TrackIdentity,
        extra: &[(&'static str, String)],
    ) -> Result<Result<String, SkipReason>, ScrobbleError> {
        if !self.enabled {
            return Ok(Err(SkipReason::Disabled));
        }

        let credentials = Self::require(settings, SettingKey::ApiKey).and_then(|api_key| {
            let secret = Self::require(settings, SettingKey::ApiSecret)?;
            let session_key = Self::require(settings, SettingKey::SessionKey)?;
            Ok((api_key, secret, session_key))
        });
        let (api_key, secret, session_key) = match credentials {
            Ok(credentials) => credentials,
            Err(key) => return Ok(Err(SkipReason::MissingCredentials(key))),
        };

        let mut params = BTreeMap::from([
            ("method", method.to_string()),
            ("api_key", api_key),
            ("sk", session_key),
            ("artist", track.artist.clone()),
            ("track", track.title.clone()),
        ]);
        params.extend(extra.iter().cloned());

        let response = self.transport.post_form(&self.api_url, &Self::signed(params, &secret))?;
        Self::check(response).map(Ok)
    }

    /// Signed GET for the auth methods, which need no session
    fn auth_call(
        &self,
        settings: &dyn SettingsStore,
        method: &str,
        extra: &[(&'static str, String)],
    ) -> Result<String, ScrobbleError> {
        let api_key = Self::require(settings, SettingKey::ApiKey).map_err(ScrobbleError::MissingSetting)?;
        let secret = Self::require(settings, SettingKey::ApiSecret).map_err(ScrobbleError::MissingSetting)?;

        let mut params = BTreeMap::from([("method", method.to_string()), ("api_key", api_key)]);
        params.extend(extra.iter().cloned());

        let response = self.transport.get(&self.api_url, &Self::signed(params, &secret))?;
        Self::check(response)
    }

    /// Request an unauthorized token for the web approval step
    pub fn get_token(&self, settings: &dyn SettingsStore) -> Result<String, ScrobbleError> {
        let body = self.auth_call(settings, "auth.getToken", &[])?;
        let response: TokenResponse = serde_json::from_str(&body)?;
        Ok(response.token)
    }

    /// Exchange an approved token for a session key
    pub fn get_session(&self, settings: &dyn SettingsStore, token: &str) -> Result<String, ScrobbleError> {
        let body = self.auth_call(settings, "auth.getSession", &[("token", token.to_string())])?;
        let response: SessionResponse = serde_json::from_str(&body)?;
        Ok(response.session.key)
    }
}

/// Log scrobbles Last.fm accepted over HTTP but filtered out
fn warn_if_ignored(track: &TrackIdentity, body: &str) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return;
    };

    let ignored = value
        .pointer("/scrobbles/@attr/ignored")
        .and_then(|v| v.as_u64().or_else(|| v.as_str()?.parse().ok()))
        .unwrap_or(0);

    if ignored > 0 {
        let reason = value
            .pointer("/scrobbles/scrobble/ignoredMessage/#text")
            .and_then(|v| v.as_str())
            .unwrap_or("no reason given");
        log::warn!("Last.fm ignored scrobble for {}: {}", track, reason);
    }
}

impl<T: Transport> Scrobbler for LastFmClient<T> {
    fn now_playing(&self, settings: &dyn SettingsStore, track: &TrackIdentity) -> ReportResult {
        log::debug!("Sending now playing to Last.fm: {}", track);

        match self.submit(settings, "track.updateNowPlaying", track, &[])? {
            Ok(_) => Ok(Report::Sent),
            Err(reason) => Ok(Report::Skipped(reason)),
        }
    }

    fn scrobble(&self, settings: &dyn SettingsStore, track: &TrackIdentity) -> ReportResult {
        log::debug!("Scrobbling to Last.fm: {}", track);

        let timestamp = Utc::now().timestamp().to_string();
        match self.submit(settings, "track.scrobble", track, &[("timestamp", timestamp)])? {
            Ok(body) => {
                warn_if_ignored(track, &body);
                Ok(Report::Sent)
            }
            Err(reason) => Ok(Report::Skipped(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrobbler::transport::FakeTransport;
    use crate::settings::MemorySettings;

    const URL: &str = "https://api.example/2.0/";

    fn client(transport: FakeTransport) -> LastFmClient<FakeTransport> {
        LastFmClient::new(transport, URL, true)
    }

    fn xy() -> TrackIdentity {
        TrackIdentity::new("X", "Y")
    }

    #[test]
    fn now_playing_posts_signed_form() {
        let client = client(FakeTransport::default());
        let report = client.now_playing(&MemorySettings::with_credentials(), &xy()).unwrap();
        assert_eq!(report, Report::Sent);

        let sent = client.transport.sent.borrow();
        assert_eq!(sent.len(), 1);
        let request = &sent[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, URL);
        assert_eq!(request.param("method"), Some("track.updateNowPlaying"));
        assert_eq!(request.param("api_key"), Some("KEY"));
        assert_eq!(request.param("sk"), Some("SESS"));
        assert_eq!(request.param("artist"), Some("X"));
        assert_eq!(request.param("track"), Some("Y"));
        assert_eq!(request.param("format"), Some("json"));
        assert_eq!(request.param("api_sig"), Some("2ca363c29f1060c660a57f1d91d4b7ee"));
        assert_eq!(request.param("timestamp"), None);
    }

    #[test]
    fn scrobble_carries_current_timestamp() {
        let client = client(FakeTransport::default());
        let before = Utc::now().timestamp();
        let report = client.scrobble(&MemorySettings::with_credentials(), &xy()).unwrap();
        let after = Utc::now().timestamp();
        assert_eq!(report, Report::Sent);

        let sent = client.transport.sent.borrow();
        let request = &sent[0];
        assert_eq!(request.param("method"), Some("track.scrobble"));
        let timestamp: i64 = request.param("timestamp").unwrap().parse().unwrap();
        assert!((before..=after).contains(&timestamp));

        let mut signed: BTreeMap<&str, String> = request
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        let signature = signed.remove("api_sig").unwrap();
        assert_eq!(sign(&signed, "SECRET"), signature);
    }

    #[test]
    fn missing_session_skips_without_network() {
        let client = client(FakeTransport::default());
        let settings = MemorySettings::with_credentials().without(SettingKey::SessionKey);

        assert_eq!(
            client.now_playing(&settings, &xy()).unwrap(),
            Report::Skipped(SkipReason::MissingCredentials(SettingKey::SessionKey))
        );
        assert_eq!(
            client.scrobble(&settings, &xy()).unwrap(),
            Report::Skipped(SkipReason::MissingCredentials(SettingKey::SessionKey))
        );
        assert!(client.transport.sent.borrow().is_empty());
    }

    #[test]
    fn missing_secret_skips_without_network() {
        let client = client(FakeTransport::default());
        let settings = MemorySettings::with_credentials().without(SettingKey::ApiSecret);

        assert_eq!(
            client.scrobble(&settings, &xy()).unwrap(),
            Report::Skipped(SkipReason::MissingCredentials(SettingKey::ApiSecret))
        );
        assert!(client.transport.sent.borrow().is_empty());
    }

    #[test]
    fn disabled_client_skips() {
        let client = LastFmClient::new(FakeTransport::default(), URL, false);
        assert_eq!(
            client.now_playing(&MemorySettings::with_credentials(), &xy()).unwrap(),
            Report::Skipped(SkipReason::Disabled)
        );
        assert!(client.transport.sent.borrow().is_empty());
    }

    #[test]
    fn api_error_payload_is_an_error() {
        let transport = FakeTransport::default().respond(403, r#"{"error":9,"message":"Invalid session key"}"#);
        let client = client(transport);

        match client.scrobble(&MemorySettings::with_credentials(), &xy()) {
            Err(ScrobbleError::Api { code, message }) => {
                assert_eq!(code, 9);
                assert_eq!(message, "Invalid session key");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn error_payload_with_ok_status_is_an_error() {
        let transport = FakeTransport::default().respond(200, r#"{"error":11,"message":"Service Offline"}"#);
        let client = client(transport);

        assert!(matches!(
            client.now_playing(&MemorySettings::with_credentials(), &xy()),
            Err(ScrobbleError::Api { code: 11, .. })
        ));
    }

    #[test]
    fn http_failure_without_payload() {
        let transport = FakeTransport::default().respond(503, "<html>Bad Gateway</html>");
        let client = client(transport);

        assert!(matches!(
            client.now_playing(&MemorySettings::with_credentials(), &xy()),
            Err(ScrobbleError::Http { status: 503, .. })
        ));
    }

    #[test]
    fn ignored_scrobble_still_counts_as_sent() {
        let body = r##"{"scrobbles":{"@attr":{"accepted":0,"ignored":1},"scrobble":{"ignoredMessage":{"code":"1","#text":"Artist was ignored"}}}}"##;
        let client = client(FakeTransport::default().respond(200, body));

        assert_eq!(
            client.scrobble(&MemorySettings::with_credentials(), &xy()).unwrap(),
            Report::Sent
        );
    }

    #[test]
    fn get_token_uses_signed_get() {
        let client = client(FakeTransport::default().respond(200, r#"{"token":"tok"}"#));

        let token = client.get_token(&MemorySettings::with_credentials()).unwrap();
        assert_eq!(token, "tok");

        let sent = client.transport.sent.borrow();
        assert_eq!(sent[0].method, "GET");
        assert_eq!(sent[0].param("method"), Some("auth.getToken"));
        assert_eq!(sent[0].param("api_sig"), Some("66ee63a18da3c919f987b342697d913c"));
        assert_eq!(sent[0].param("sk"), None);
    }

    #[test]
    fn get_session_returns_nested_key() {
        let body = r#"{"session":{"name":"user","key":"d580d57f32848f5dcf574d1ce18d78b2","subscriber":0}}"#;
        let client = client(FakeTransport::default().respond(200, body));
        let settings = MemorySettings::with_credentials().without(SettingKey::SessionKey);

        let key = client.get_session(&settings, "tok").unwrap();
        assert_eq!(key, "d580d57f32848f5dcf574d1ce18d78b2");
        assert_eq!(client.transport.sent.borrow()[0].param("token"), Some("tok"));
    }

    #[test]
    fn auth_calls_need_app_credentials() {
        let client = client(FakeTransport::default());
        let settings = MemorySettings::default();

        assert!(matches!(
            client.get_token(&settings),
            Err(ScrobbleError::MissingSetting(SettingKey::ApiKey))
        ));
        assert!(client.transport.sent.borrow().is_empty());
    }
}
