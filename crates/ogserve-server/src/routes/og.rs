use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use ogserve_core::notify::NotifyLevel;
use ogserve_core::render::TemplateKind;
use ogserve_core::{paths, OgError};

use crate::error::AppError;
use crate::state::AppState;

/// GET /og/news/{slug}: the social card for one article.
pub async fn news_card(
    State(app): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    paths::validate_slug(&slug)?;

    if !app.readiness.store() {
        return Err(OgError::StoreUnavailable("news directory is unreachable".into()).into());
    }

    let article = app
        .store
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| OgError::NewsNotFound(slug.clone()))?;

    let card = match app.cards.generate(TemplateKind::News, &article, false).await {
        Ok(card) => card,
        Err(e) => {
            tracing::error!(slug, error = %e, "card generation failed");
            app.alert(
                NotifyLevel::Critical,
                format!("card generation failed for '{slug}'"),
                Some(e.to_string()),
            );
            return Err(e.into());
        }
    };

    Ok(([(header::CONTENT_TYPE, card.content_type)], card.bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use ogserve_core::config::RuntimeConfig;
    use ogserve_core::news::NewsArticle;
    use tempfile::TempDir;

    fn seeded_state(dir: &TempDir) -> AppState {
        let news_dir = dir.path().join("assets/news");
        std::fs::create_dir_all(&news_dir).unwrap();
        let article = NewsArticle {
            slug: "cup-final".to_string(),
            title: "Cup final goes to penalties".to_string(),
            image_url: "http://127.0.0.1:9/final.jpg".to_string(),
            brand: None,
            published_at: None,
        };
        std::fs::write(
            news_dir.join("cup-final.json"),
            serde_json::to_vec(&article).unwrap(),
        )
        .unwrap();

        AppState::new(RuntimeConfig {
            root: dir.path().to_path_buf(),
            news_dir,
            ..RuntimeConfig::default()
        })
    }

    #[tokio::test]
    async fn known_slug_returns_a_card() {
        let dir = TempDir::new().unwrap();
        let app = seeded_state(&dir);

        let response = news_card(State(app), Path("cup-final".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/svg+xml"
        );
    }

    #[tokio::test]
    async fn unknown_slug_is_404() {
        let dir = TempDir::new().unwrap();
        let app = seeded_state(&dir);

        let err = news_card(State(app), Path("nope".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_slug_is_rejected_before_lookup() {
        let dir = TempDir::new().unwrap();
        let app = seeded_state(&dir);

        let err = news_card(State(app), Path("../escape".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unreachable_store_is_503() {
        let dir = TempDir::new().unwrap();
        let app = seeded_state(&dir);
        app.readiness.set_store(false);

        let err = news_card(State(app), Path("cup-final".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
