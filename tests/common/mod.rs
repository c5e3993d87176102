//! In-memory collaborators for HTTP-level tests

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum_test::TestServer;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use marquee_api::{
    create_router,
    db::{HistoryStore, UserStore},
    models::{
        Genre, GenreMovies, MovieDetails, MovieId, MovieRef, MovieSummary, NewUser, UserRecord,
        ViewHistoryEntry,
    },
    services::{
        auth::{AuthService, TokenService},
        mail::{MailTransport, Mailer, MailerHandle, OutgoingMail},
        providers::MovieCatalog,
    },
    AppError, AppResult, AppState,
};

pub fn summary(id: MovieId) -> MovieSummary {
    MovieSummary {
        id,
        title: format!("Movie {}", id),
        overview: None,
        poster_path: Some(format!("/{}.jpg", id)),
        backdrop_path: None,
        release_date: None,
        vote_average: Some(7.0),
        genre_ids: vec![],
    }
}

/// Catalog serving fixed listings; remembers every recommendation seed
#[derive(Default)]
pub struct FakeCatalog {
    pub seeds: Mutex<Vec<MovieId>>,
}

#[async_trait::async_trait]
impl MovieCatalog for FakeCatalog {
    async fn search_movies(&self, query: &str) -> AppResult<Vec<MovieSummary>> {
        let mut movie = summary(1);
        movie.title = query.to_string();
        Ok(vec![movie])
    }

    async fn most_popular(&self) -> AppResult<Vec<MovieSummary>> {
        Ok(vec![summary(100), summary(101)])
    }

    async fn top_rated(&self) -> AppResult<Vec<MovieSummary>> {
        Ok(vec![summary(200)])
    }

    async fn latest_release(&self) -> AppResult<Vec<MovieSummary>> {
        Ok(vec![summary(300)])
    }

    async fn all_genre_movies(&self) -> AppResult<Vec<GenreMovies>> {
        Ok(vec![GenreMovies {
            genre: Genre {
                id: 18,
                name: "Drama".to_string(),
            },
            movies: vec![summary(400)],
        }])
    }

    async fn movie_by_id(&self, movie_id: MovieId) -> AppResult<MovieDetails> {
        if movie_id <= 0 {
            return Err(AppError::ExternalApi(
                "TMDB API returned status 404 Not Found".to_string(),
            ));
        }
        Ok(MovieDetails {
            id: movie_id,
            title: format!("Movie {}", movie_id),
            overview: Some("Plot".to_string()),
            tagline: None,
            poster_path: Some(format!("/{}.jpg", movie_id)),
            backdrop_path: None,
            release_date: None,
            runtime: Some(120),
            vote_average: Some(7.5),
            genres: vec![],
        })
    }

    async fn similar_movies(&self, movie_id: MovieId) -> AppResult<Vec<MovieSummary>> {
        Ok(vec![summary(movie_id + 1000)])
    }

    async fn recommendations(&self, seed_movie_id: MovieId) -> AppResult<Vec<MovieSummary>> {
        self.seeds.lock().unwrap().push(seed_movie_id);
        Ok(vec![summary(seed_movie_id + 5000)])
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct Visit {
    user_id: Uuid,
    movie_id: MovieId,
    at: DateTime<Utc>,
    seq: u64,
}

#[derive(Default)]
struct HistoryData {
    movies: HashMap<MovieId, MovieRef>,
    visits: Vec<Visit>,
    next_seq: u64,
}

/// History store with the same keying as the Postgres one
#[derive(Default)]
pub struct FakeHistoryStore {
    data: Mutex<HistoryData>,
}

impl FakeHistoryStore {
    pub fn visit_count(&self, user_id: Uuid) -> usize {
        let data = self.data.lock().unwrap();
        data.visits.iter().filter(|v| v.user_id == user_id).count()
    }
}

#[async_trait::async_trait]
impl HistoryStore for FakeHistoryStore {
    async fn get_history(&self, user_id: Uuid) -> AppResult<Vec<ViewHistoryEntry>> {
        let data = self.data.lock().unwrap();
        let mut visits: Vec<&Visit> = data.visits.iter().filter(|v| v.user_id == user_id).collect();
        visits.sort_by(|a, b| (b.at, b.seq).cmp(&(a.at, a.seq)));

        Ok(visits
            .into_iter()
            .filter_map(|v| {
                data.movies.get(&v.movie_id).map(|m| ViewHistoryEntry {
                    movie_id: m.id,
                    title: m.title.clone(),
                    poster_path: m.poster_path.clone(),
                    viewed_at: v.at,
                })
            })
            .collect())
    }

    async fn upsert_movie(&self, movie: &MovieRef) -> AppResult<()> {
        let mut data = self.data.lock().unwrap();
        data.movies.entry(movie.id).or_insert_with(|| movie.clone());
        Ok(())
    }

    async fn record_visit(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut data = self.data.lock().unwrap();
        if data
            .visits
            .iter()
            .any(|v| v.user_id == user_id && v.movie_id == movie_id)
        {
            return Ok(());
        }
        let seq = data.next_seq;
        data.next_seq += 1;
        data.visits.push(Visit {
            user_id,
            movie_id,
            at,
            seq,
        });
        Ok(())
    }

    async fn touch_visit(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut data = self.data.lock().unwrap();
        let seq = data.next_seq;
        data.next_seq += 1;
        if let Some(visit) = data
            .visits
            .iter_mut()
            .find(|v| v.user_id == user_id && v.movie_id == movie_id)
        {
            visit.at = at;
            visit.seq = seq;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeUserStore {
    users: Mutex<Vec<UserRecord>>,
}

impl FakeUserStore {
    pub fn reset_code_for(&self, email: &str) -> Option<String> {
        let users = self.users.lock().unwrap();
        users
            .iter()
            .find(|u| u.email == email)
            .and_then(|u| u.reset_code.clone())
    }
}

#[async_trait::async_trait]
impl UserStore for FakeUserStore {
    async fn create_user(&self, user: &NewUser) -> AppResult<bool> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Ok(false);
        }
        users.push(UserRecord {
            user_id: user.user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            dob: user.dob,
            password: user.password_hash.clone(),
            image_url: user.image_url.clone(),
            reset_code: None,
            created_on: user.created_on,
        });
        Ok(true)
    }

    async fn find_by_login(&self, login: &str) -> AppResult<Option<UserRecord>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.email == login || u.username == login)
            .cloned())
    }

    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<UserRecord>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.user_id == user_id) {
            user.password = password_hash.to_string();
        }
        Ok(())
    }

    async fn set_reset_code(&self, email: &str, code: &str) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.email == email) {
            user.reset_code = Some(code.to_string());
        }
        Ok(())
    }

    async fn reset_password(
        &self,
        email: &str,
        code: &str,
        password_hash: &str,
    ) -> AppResult<bool> {
        let mut users = self.users.lock().unwrap();
        match users
            .iter_mut()
            .find(|u| u.email == email && u.reset_code.as_deref() == Some(code))
        {
            Some(user) => {
                user.password = password_hash.to_string();
                user.reset_code = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct FakeMailTransport {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait::async_trait]
impl MailTransport for FakeMailTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> AppResult<()> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub catalog: Arc<FakeCatalog>,
    pub history: Arc<FakeHistoryStore>,
    pub users: Arc<FakeUserStore>,
    pub mail: Arc<FakeMailTransport>,
    pub mailer_handle: MailerHandle,
}

impl TestApp {
    pub fn new() -> Self {
        let catalog = Arc::new(FakeCatalog::default());
        let history = Arc::new(FakeHistoryStore::default());
        let users = Arc::new(FakeUserStore::default());
        let mail = Arc::new(FakeMailTransport::default());
        let (mailer, mailer_handle) = Mailer::new(mail.clone());

        let auth = AuthService::new(
            users.clone(),
            history.clone(),
            TokenService::new("integration-secret", 1),
            mailer,
            4,
        );
        let state = Arc::new(AppState::new(catalog.clone(), history.clone(), auth));
        let server = TestServer::new(create_router(state)).unwrap();

        Self {
            server,
            catalog,
            history,
            users,
            mail,
            mailer_handle,
        }
    }

    pub async fn signup(&self, username: &str, email: &str, password: &str) {
        self.server
            .post("/api/auth/signup")
            .json(&json!({
                "email": email,
                "username": username,
                "password": password,
                "dob": "07 Mar 1994",
                "imageUrl": format!("https://img.example.com/{}.png", username),
            }))
            .await
            .assert_status_ok();
    }

    /// Signs up and logs in a fresh user, returning the bearer header value and user id
    pub async fn signed_in(&self, username: &str) -> (String, Uuid) {
        let email = format!("{}@example.com", username);
        self.signup(username, &email, "secret-pass").await;

        let response = self
            .server
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": "secret-pass" }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        let token = body["token"].as_str().unwrap().to_string();
        let user_id = Uuid::parse_str(body["user"]["userId"].as_str().unwrap()).unwrap();
        (format!("Bearer {}", token), user_id)
    }

    /// Gives the background mail sender a moment to drain
    pub async fn settle_mail(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
