use std::sync::atomic::Ordering;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use gallery_server::entity::{image, project, work, work_tag};

use crate::common::{TestApp, image_part, images_of, routes, work_form};

async fn update(app: &TestApp, id: i32, form: Form) -> crate::common::TestResponse {
    let token = app.admin_token();
    app.send_form(Method::PUT, &routes::work(id), form, Some(&token))
        .await
}

fn tag_names(work: &serde_json::Value) -> Vec<String> {
    work["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect()
}

mod create_work {
    use super::*;

    #[tokio::test]
    async fn admin_creates_work_with_images_in_submission_order() {
        let app = TestApp::spawn().await;
        let form = work_form("RX-78-2 Gundam")
            .text("kitName", "MG RX-78-2 Ver.3.0")
            .text("maker", "Bandai")
            .text("tags", "MG, weathering, MG")
            .text("endDate", "2024-03-09")
            .part("subImages", image_part("front.png", 2))
            .part("subImages", image_part("back.png", 3));

        let id = app.create_work(form).await;
        let detail = app.work(id).await;

        assert_eq!(detail["title"], "RX-78-2 Gundam");
        assert_eq!(detail["kitName"], "MG RX-78-2 Ver.3.0");
        assert_eq!(detail["endDate"], "2024-03-09");
        assert_eq!(tag_names(&detail), vec!["MG", "weathering"]);

        let main = detail["mainImage"].as_str().unwrap();
        assert!(main.starts_with("/uploads/") && main.contains("-main-"));
        assert!(app.blob_path(main).exists());

        let images = detail["images"].as_array().unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0]["order"], 0);
        assert_eq!(images[1]["order"], 1);
        assert!(images[0]["url"].as_str().unwrap().ends_with("-sub-0-front.png"));
        assert!(images[1]["url"].as_str().unwrap().ends_with("-sub-1-back.png"));
        assert_eq!(app.blob_count(), 3);
    }

    #[tokio::test]
    async fn stored_photos_are_served_publicly() {
        let app = TestApp::spawn().await;
        let id = app.create_work(work_form("Zaku II")).await;
        let main = app.work(id).await["mainImage"]
            .as_str()
            .unwrap()
            .to_string();

        let res = app.get(&main).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn disguised_script_is_rejected_and_nothing_is_stored() {
        let app = TestApp::spawn().await;
        let script = Part::bytes(b"#!/bin/sh\nrm -rf /\n".to_vec())
            .file_name("photo.jpg")
            .mime_str("image/jpeg")
            .unwrap();
        let form = work_form("Dom").part("subImages", script);

        let token = app.admin_token();
        let res = app
            .send_form(Method::POST, routes::WORKS, form, Some(&token))
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["details"]["subImages"].is_array());
        assert_eq!(app.blob_count(), 0);
        assert_eq!(work::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_title_and_main_image_are_reported_together() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let res = app
            .send_form(
                Method::POST,
                routes::WORKS,
                Form::new().text("kitName", "HG Zaku"),
                Some(&token),
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["details"]["title"].is_array());
        assert!(res.body["details"]["mainImage"].is_array());
    }

    #[tokio::test]
    async fn unknown_project_is_rejected_before_storing() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let res = app
            .send_form(
                Method::POST,
                routes::WORKS,
                work_form("Gelgoog").text("projectId", "9999"),
                Some(&token),
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["details"]["projectId"].is_array());
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn project_deleted_during_submission_is_a_field_error() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let project_id = app.create_project("Zeon").await;

        let db = app.db.clone();
        *app.store.before_save.lock().unwrap() = Some(Box::pin(async move {
            project::Entity::delete_by_id(project_id)
                .exec(&db)
                .await
                .unwrap();
        }));

        let res = app
            .send_form(
                Method::POST,
                routes::WORKS,
                work_form("Gelgoog")
                    .text("projectId", project_id.to_string())
                    .part("subImages", image_part("a.png", 40)),
                Some(&token),
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert!(res.body["details"]["projectId"].is_array());
        assert_eq!(app.blob_count(), 0);
        assert_eq!(work::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let app = TestApp::spawn().await;
        let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        data.resize(5 * 1024 * 1024 + 1, 0);
        let form = Form::new().text("title", "Big").part(
            "mainImage",
            Part::bytes(data).file_name("big.png").mime_str("image/png").unwrap(),
        );

        let token = app.admin_token();
        let res = app
            .send_form(Method::POST, routes::WORKS, form, Some(&token))
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert!(res.body["details"]["mainImage"].is_array());
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn empty_file_parts_are_ignored() {
        let app = TestApp::spawn().await;
        let blank = Part::bytes(Vec::new())
            .file_name("")
            .mime_str("application/octet-stream")
            .unwrap();
        let id = app
            .create_work(work_form("Acguy").part("subImages", blank))
            .await;

        assert!(images_of(&app.work(id).await).is_empty());
    }

    #[tokio::test]
    async fn failed_blob_save_creates_no_work() {
        let app = TestApp::spawn().await;
        // Main image saves, first sub-image fails.
        app.store.save_budget.store(1, Ordering::SeqCst);

        let token = app.admin_token();
        let res = app
            .send_form(
                Method::POST,
                routes::WORKS,
                work_form("Kampfer").part("subImages", image_part("a.png", 4)),
                Some(&token),
            )
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");
        assert_eq!(work::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(image::Entity::find().count(&app.db).await.unwrap(), 0);
    }
}

mod update_work {
    use super::*;

    #[tokio::test]
    async fn delete_add_and_reorder_in_one_submission() {
        let app = TestApp::spawn().await;
        let id = app
            .create_work(
                work_form("Sazabi")
                    .part("subImages", image_part("a.png", 10))
                    .part("subImages", image_part("b.png", 11)),
            )
            .await;
        let before = images_of(&app.work(id).await);
        let (a_id, a_url) = before[0].clone();
        let (b_id, _) = before[1].clone();

        let form = Form::new()
            .text("title", "Sazabi")
            .text("deleteImageUrls", a_url.clone())
            .part("subImages", image_part("c.png", 12))
            .text("imageOrder", json!([{ "id": b_id }, { "isNew": true }]).to_string());
        let res = update(&app, id, form).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], true);

        let detail = app.work(id).await;
        let images = detail["images"].as_array().unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0]["id"], b_id);
        assert_eq!(images[0]["order"], 0);
        assert!(images[1]["url"].as_str().unwrap().ends_with("-sub-0-c.png"));
        assert_eq!(images[1]["order"], 1);

        let a_row = image::Entity::find_by_id(a_id as i32)
            .one(&app.db)
            .await
            .unwrap();
        assert!(a_row.is_none());
        assert!(app.store.attempted_deletes().contains(&a_url));
        assert!(!app.blob_path(&a_url).exists());
    }

    #[tokio::test]
    async fn another_works_image_is_neither_deleted_nor_reordered() {
        let app = TestApp::spawn().await;
        let mine = app
            .create_work(work_form("Mine").part("subImages", image_part("x.png", 20)))
            .await;
        let theirs = app
            .create_work(work_form("Theirs").part("subImages", image_part("y.png", 21)))
            .await;
        let (x_id, _) = images_of(&app.work(mine).await)[0].clone();
        let (y_id, y_url) = images_of(&app.work(theirs).await)[0].clone();

        // A write not scoped to `mine` would move y to position 1.
        let form = Form::new()
            .text("title", "Mine")
            .text("deleteImageUrls", y_url.clone())
            .text("imageOrder", json!([{ "id": x_id }, { "id": y_id }]).to_string());
        let res = update(&app, mine, form).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let theirs_images = app.work(theirs).await["images"].clone();
        assert_eq!(theirs_images[0]["id"], y_id);
        assert_eq!(theirs_images[0]["order"], 0);
        assert!(app.blob_path(&y_url).exists());
        assert!(!app.store.attempted_deletes().contains(&y_url));
        let mine_images = app.work(mine).await["images"].clone();
        assert_eq!(mine_images.as_array().unwrap().len(), 1);
        assert_eq!(mine_images[0]["id"], x_id);
        assert_eq!(mine_images[0]["order"], 0);
    }

    #[tokio::test]
    async fn repeating_an_order_is_idempotent() {
        let app = TestApp::spawn().await;
        let id = app
            .create_work(
                work_form("Nu Gundam")
                    .part("subImages", image_part("a.png", 30))
                    .part("subImages", image_part("b.png", 31))
                    .part("subImages", image_part("c.png", 32)),
            )
            .await;
        let ids: Vec<i64> = images_of(&app.work(id).await)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        let order = json!([{ "id": ids[2] }, { "id": ids[0] }, { "id": ids[1] }]).to_string();

        let mut snapshots = Vec::new();
        for _ in 0..2 {
            let form = Form::new()
                .text("title", "Nu Gundam")
                .text("imageOrder", order.clone());
            assert_eq!(update(&app, id, form).await.status, 200);
            snapshots.push(app.work(id).await["images"].clone());
        }

        assert_eq!(snapshots[0], snapshots[1]);
        let reordered: Vec<i64> = images_of(&app.work(id).await)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(reordered, vec![ids[2], ids[0], ids[1]]);
    }

    #[tokio::test]
    async fn uploads_beyond_the_order_sort_last() {
        let app = TestApp::spawn().await;
        let id = app.create_work(work_form("Hi-Nu")).await;

        let form = Form::new()
            .text("title", "Hi-Nu")
            .part("subImages", image_part("first.png", 40))
            .part("subImages", image_part("second.png", 41))
            .text("imageOrder", json!([{ "isNew": true }]).to_string());
        assert_eq!(update(&app, id, form).await.status, 200);

        let detail = app.work(id).await;
        let images = detail["images"].as_array().unwrap();
        assert_eq!(images.len(), 2);
        assert!(images[0]["url"].as_str().unwrap().ends_with("-sub-0-first.png"));
        assert_eq!(images[0]["order"], 0);
        assert!(images[1]["url"].as_str().unwrap().ends_with("-sub-1-second.png"));
        assert_eq!(images[1]["order"], 999);
    }

    #[tokio::test]
    async fn replacing_main_image_removes_the_old_blob() {
        let app = TestApp::spawn().await;
        let id = app.create_work(work_form("Qubeley")).await;
        let old_main = app.work(id).await["mainImage"]
            .as_str()
            .unwrap()
            .to_string();

        let form = Form::new()
            .text("title", "Qubeley")
            .part("mainImage", image_part("new-main.png", 50));
        assert_eq!(update(&app, id, form).await.status, 200);

        let new_main = app.work(id).await["mainImage"]
            .as_str()
            .unwrap()
            .to_string();
        assert_ne!(new_main, old_main);
        assert!(new_main.ends_with("-main-new-main.png"));
        assert!(app.blob_path(&new_main).exists());
        assert!(!app.blob_path(&old_main).exists());
    }

    #[tokio::test]
    async fn scalars_and_tags_are_replaced() {
        let app = TestApp::spawn().await;
        let id = app
            .create_work(
                work_form("Zeta")
                    .text("kitName", "HG Zeta")
                    .text("tags", "a, b"),
            )
            .await;

        let form = Form::new()
            .text("title", "Zeta Gundam")
            .text("genre", "MS")
            .text("tags", "b, c ,b");
        assert_eq!(update(&app, id, form).await.status, 200);

        let detail = app.work(id).await;
        assert_eq!(detail["title"], "Zeta Gundam");
        assert!(detail["kitName"].is_null());
        assert_eq!(detail["genre"], "MS");
        assert_eq!(tag_names(&detail), vec!["b", "c"]);

        let links = work_tag::Entity::find()
            .filter(work_tag::Column::WorkId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(links, 2);

        // Orphaned tags are kept.
        let tags = app.get(routes::TAGS).await.body;
        assert_eq!(tags, json!(["a", "b", "c"]));
    }

    #[tokio::test]
    async fn malformed_order_is_rejected_without_storing() {
        let app = TestApp::spawn().await;
        let id = app.create_work(work_form("Psycho")).await;
        let stored = app.blob_count();

        let form = Form::new()
            .text("title", "Psycho")
            .part("subImages", image_part("a.png", 60))
            .text("imageOrder", "[{\"id\":");
        let res = update(&app, id, form).await;

        assert_eq!(res.status, 400);
        assert!(res.body["details"]["imageOrder"].is_array());
        assert_eq!(app.blob_count(), stored);
    }

    #[tokio::test]
    async fn missing_work_is_not_found() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("title", "Ghost")
            .part("subImages", image_part("a.png", 70));

        let res = update(&app, 4242, form).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(app.blob_count(), 0);
    }
}

mod delete_work {
    use super::*;

    #[tokio::test]
    async fn removes_rows_and_blobs_but_keeps_tags() {
        let app = TestApp::spawn().await;
        let id = app
            .create_work(
                work_form("Gyan")
                    .text("tags", "Zeon")
                    .part("subImages", image_part("a.png", 80)),
            )
            .await;
        assert_eq!(app.blob_count(), 2);

        let token = app.admin_token();
        let res = app.delete(&routes::work(id), Some(&token)).await;
        assert_eq!(res.status, 200, "{}", res.text);

        assert_eq!(app.get(&routes::work(id)).await.status, 404);
        assert_eq!(image::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(work_tag::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(app.blob_count(), 0);
        assert_eq!(app.get(routes::TAGS).await.body, json!(["Zeon"]));
    }

    #[tokio::test]
    async fn storage_failure_does_not_fail_the_delete() {
        let app = TestApp::spawn().await;
        let id = app
            .create_work(work_form("Dom").part("subImages", image_part("a.png", 90)))
            .await;
        let detail = app.work(id).await;
        app.store.fail_deletes.store(true, Ordering::SeqCst);

        let token = app.admin_token();
        let res = app.delete(&routes::work(id), Some(&token)).await;
        assert_eq!(res.status, 200, "{}", res.text);

        assert_eq!(app.get(&routes::work(id)).await.status, 404);
        let attempted = app.store.attempted_deletes();
        assert!(attempted.contains(&detail["mainImage"].as_str().unwrap().to_string()));
        assert!(attempted.contains(&images_of(&detail)[0].1));
    }

    #[tokio::test]
    async fn missing_work_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.admin_token();
        let res = app.delete(&routes::work(31337), Some(&token)).await;
        assert_eq!(res.status, 404);
    }
}
