use serde_json::json;

use crate::common::{TestApp, routes};

mod tables {
    use super::*;

    #[tokio::test]
    async fn unknown_table_slug_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app.get_with_token(&routes::master("users"), &admin).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn statuses_are_seeded_in_order() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app.get_with_token(routes::STATUSES, &admin).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let names: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Diterima", "Terdaftar", "Ditolak", "Dalam Proses"]);
    }

    #[tokio::test]
    async fn listing_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::master("ip-types")).await;

        assert_eq!(res.status, 401);
    }
}

mod writes {
    use super::*;

    #[tokio::test]
    async fn admin_can_create_rename_and_delete_an_agency() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let id = app
            .create_master_row(&admin, "agencies", json!({"name": "Dinas Pariwisata"}))
            .await;

        let renamed = app
            .patch_with_token(
                &routes::master_row("agencies", id),
                &json!({"name": "Dinas Pariwisata dan Budaya"}),
                &admin,
            )
            .await;
        assert_eq!(renamed.status, 200, "{}", renamed.text);
        assert_eq!(renamed.body["name"], "Dinas Pariwisata dan Budaya");

        let deleted = app
            .delete_with_token(&routes::master_row("agencies", id), &admin)
            .await;
        assert_eq!(deleted.status, 204, "{}", deleted.text);

        let listed = app.get_with_token(&routes::master("agencies"), &admin).await;
        assert_eq!(listed.body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn ip_class_is_created_with_an_explicit_number() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                &routes::master("ip-classes"),
                &json!({"id": 43, "name": "Restoran", "kind": "Services"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["id"], 43);
        assert_eq!(res.body["kind"], "Services");
    }

    #[tokio::test]
    async fn ip_class_number_outside_the_classification_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                &routes::master("ip-classes"),
                &json!({"id": 46, "name": "Nope", "kind": "Goods"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn duplicate_name_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.create_master_row(&admin, "ip-types", json!({"name": "Paten"}))
            .await;

        let res = app
            .post_with_token(&routes::master("ip-types"), &json!({"name": "Paten"}), &admin)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn regular_user_cannot_write() {
        let app = TestApp::spawn().await;
        let (_, token) = app
            .create_user_with_role("operator", "operator-pass", "user")
            .await;

        let res = app
            .post_with_token(&routes::master("ip-types"), &json!({"name": "Paten"}), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let listed = app.get_with_token(&routes::master("ip-types"), &token).await;
        assert_eq!(listed.status, 200);
    }

    #[tokio::test]
    async fn updating_a_missing_row_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .patch_with_token(
                &routes::master_row("ip-types", 9999),
                &json!({"name": "Hak Cipta"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn row_referenced_by_a_record_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let reference = app.seed_reference(&admin).await;
        app.create_record(
            &admin,
            &reference,
            "Kopi Bubuk",
            "UD Maju",
            reference.status_accepted,
        )
        .await;

        let res = app
            .delete_with_token(&routes::master_row("agencies", reference.agency), &admin)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "DEPENDENCY_CONFLICT");
    }
}
