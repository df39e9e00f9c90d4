use reqwest::Method;
use reqwest::multipart::Form;

use crate::common::{TestApp, image_part, routes, work_form};

mod project_crud {
    use super::*;

    #[tokio::test]
    async fn create_with_cover_and_read_back() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let form = Form::new()
            .text("name", "Zeon mobile suits")
            .text("description", "Everything from the One Year War")
            .part("mainImage", image_part("cover.png", 1));

        let res = app
            .send_form(Method::POST, routes::PROJECTS, form, Some(&token))
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let id = res.id();

        let detail = app.get(&routes::project(id)).await;
        assert_eq!(detail.status, 200);
        assert_eq!(detail.body["name"], "Zeon mobile suits");
        let cover = detail.body["mainImage"].as_str().unwrap();
        assert!(cover.contains("-project-cover.png"));
        assert!(app.blob_path(cover).exists());
    }

    #[tokio::test]
    async fn name_is_required() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let res = app
            .send_form(
                Method::POST,
                routes::PROJECTS,
                Form::new().text("description", "no name"),
                Some(&token),
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["details"]["name"].is_array());
    }

    #[tokio::test]
    async fn replacing_cover_deletes_the_old_one() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let form = Form::new()
            .text("name", "Series")
            .part("mainImage", image_part("old.png", 2));
        let id = app
            .send_form(Method::POST, routes::PROJECTS, form, Some(&token))
            .await
            .id();
        let old_cover = app.get(&routes::project(id)).await.body["mainImage"]
            .as_str()
            .unwrap()
            .to_string();

        let form = Form::new()
            .text("name", "Series renamed")
            .part("mainImage", image_part("new.png", 3));
        let res = app
            .send_form(Method::PUT, &routes::project(id), form, Some(&token))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let detail = app.get(&routes::project(id)).await.body;
        assert_eq!(detail["name"], "Series renamed");
        assert_ne!(detail["mainImage"].as_str().unwrap(), old_cover);
        assert!(!app.blob_path(&old_cover).exists());
    }

    #[tokio::test]
    async fn update_without_cover_keeps_it() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let form = Form::new()
            .text("name", "Series")
            .part("mainImage", image_part("keep.png", 4));
        let id = app
            .send_form(Method::POST, routes::PROJECTS, form, Some(&token))
            .await
            .id();
        let cover = app.get(&routes::project(id)).await.body["mainImage"].clone();

        let res = app
            .send_form(
                Method::PUT,
                &routes::project(id),
                Form::new().text("name", "Series"),
                Some(&token),
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(app.get(&routes::project(id)).await.body["mainImage"], cover);
    }

    #[tokio::test]
    async fn deleting_a_project_keeps_its_works() {
        let app = TestApp::spawn().await;
        let project_id = app.create_project("Char's Counterattack").await;
        let work_id = app
            .create_work(work_form("Sazabi").text("projectId", project_id.to_string()))
            .await;
        assert_eq!(app.work(work_id).await["project"]["id"], project_id);

        let token = app.admin_token();
        let res = app.delete(&routes::project(project_id), Some(&token)).await;
        assert_eq!(res.status, 200, "{}", res.text);

        assert_eq!(app.get(&routes::project(project_id)).await.status, 404);
        let detail = app.work(work_id).await;
        assert!(detail["project"].is_null());
        assert!(app.blob_path(detail["mainImage"].as_str().unwrap()).exists());
    }

    #[tokio::test]
    async fn mutations_require_admin() {
        let app = TestApp::spawn().await;
        let project_id = app.create_project("Kept").await;
        let token = app.token_for("visitor@example.com");

        let res = app
            .send_form(
                Method::POST,
                routes::PROJECTS,
                Form::new().text("name", "Nope"),
                Some(&token),
            )
            .await;
        assert_eq!(res.status, 401);

        let res = app.delete(&routes::project(project_id), None).await;
        assert_eq!(res.status, 401);
        assert_eq!(app.get(&routes::project(project_id)).await.status, 200);
    }
}
