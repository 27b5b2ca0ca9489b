use serde_json::json;

use crate::common::{TestApp, pdf_part, record_form, routes};

mod creation {
    use super::*;

    #[tokio::test]
    async fn created_record_comes_back_with_its_relations() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        let form = record_form(&reference, "Kopi Bubuk Arabika", "UD Maju", reference.status_accepted)
            .text("applicantAddress", "Jl. Merdeka 1")
            .text("ipClassId", reference.ip_class.to_string())
            .text("facilitationYear", "2024")
            .text("productCategory", "Minuman");
        let res = app.post_form_with_token(routes::RECORDS, form, &token).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["title"], "Kopi Bubuk Arabika");
        assert_eq!(res.body["applicant"]["name"], "UD Maju");
        assert_eq!(res.body["applicant"]["address"], "Jl. Merdeka 1");
        assert_eq!(res.body["ipType"]["name"], "Merek");
        assert_eq!(res.body["status"]["name"], "Diterima");
        assert_eq!(res.body["agency"]["name"], "Dinas Koperasi");
        assert_eq!(res.body["ipClass"]["id"], 30);
        assert_eq!(res.body["facilitationYear"], 2024);
        assert!(res.body["certificatePath"].is_null());
    }

    #[tokio::test]
    async fn missing_title_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        let form = record_form(&reference, "   ", "UD Maju", reference.status_accepted);
        let res = app.post_form_with_token(routes::RECORDS, form, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_reference_id_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        let form = record_form(&reference, "Keripik", "UD Maju", 9999);
        let res = app.post_form_with_token(routes::RECORDS, form, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn applicant_is_shared_by_name_and_keeps_the_latest_address() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        let first = record_form(&reference, "Produk A", "CV Sejahtera", reference.status_accepted)
            .text("applicantAddress", "Alamat Lama");
        let first = app.post_form_with_token(routes::RECORDS, first, &token).await;
        assert_eq!(first.status, 201, "{}", first.text);

        let second = record_form(&reference, "Produk B", "CV Sejahtera", reference.status_accepted)
            .text("applicantAddress", "Alamat Baru");
        let second = app.post_form_with_token(routes::RECORDS, second, &token).await;
        assert_eq!(second.status, 201, "{}", second.text);

        assert_eq!(first.body["applicant"]["id"], second.body["applicant"]["id"]);

        let reread = app
            .get_with_token(&routes::record(first.id()), &token)
            .await;
        assert_eq!(reread.body["applicant"]["address"], "Alamat Baru");
    }

    #[tokio::test]
    async fn unsupported_certificate_type_is_rejected_without_storing_anything() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        let part = reqwest::multipart::Part::bytes(b"MZ".to_vec())
            .file_name("setup.exe")
            .mime_str("application/octet-stream")
            .unwrap();
        let form = record_form(&reference, "Produk", "UD Maju", reference.status_accepted)
            .part("file", part);
        let res = app.post_form_with_token(routes::RECORDS, form, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn regular_user_can_create_records() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let reference = app.seed_reference(&admin).await;
        let (_, token) = app
            .create_user_with_role("operator", "operator-pass", "user")
            .await;

        app.create_record(&token, &reference, "Sambal", "Ibu Rina", reference.status_accepted)
            .await;
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn status_filter_returns_only_matching_records() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        for (title, status) in [
            ("Satu", reference.status_accepted),
            ("Dua", reference.status_rejected),
            ("Tiga", reference.status_accepted),
        ] {
            app.create_record(&token, &reference, title, "UD Maju", status)
                .await;
        }

        let res = app
            .get_with_token(
                &format!("{}?statusId={}", routes::RECORDS, reference.status_accepted),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["totalCount"], 2);
        let titles: Vec<&str> = res.body["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["title"].as_str().unwrap())
            .collect();
        // Newest first.
        assert_eq!(titles, ["Tiga", "Satu"]);
    }

    #[tokio::test]
    async fn search_matches_title_or_applicant_name() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        app.create_record(&token, &reference, "Keripik Tempe", "UD Maju", reference.status_accepted)
            .await;
        app.create_record(&token, &reference, "Kopi", "Koperasi Tempe Jaya", reference.status_accepted)
            .await;
        app.create_record(&token, &reference, "Batik", "CV Lain", reference.status_accepted)
            .await;

        let res = app
            .get_with_token(&format!("{}?search=tEmPe", routes::RECORDS), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["totalCount"], 2);
    }

    #[tokio::test]
    async fn pagination_reports_totals() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        for i in 0..3 {
            app.create_record(&token, &reference, &format!("Produk {i}"), "UD Maju", reference.status_accepted)
                .await;
        }

        let res = app
            .get_with_token(
                &format!("{}?page=2&pageSize=2&sortBy=title&sortOrder=asc", routes::RECORDS),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["totalCount"], 3);
        assert_eq!(res.body["totalPages"], 2);
        assert_eq!(res.body["page"], 2);
        assert_eq!(res.body["records"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["records"][0]["title"], "Produk 2");
    }

    #[tokio::test]
    async fn options_list_distinct_years_newest_first() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        for (title, year) in [("A", "2022"), ("B", "2024"), ("C", "2022")] {
            let form = record_form(&reference, title, "UD Maju", reference.status_accepted)
                .text("facilitationYear", year);
            let res = app.post_form_with_token(routes::RECORDS, form, &token).await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let res = app.get_with_token(routes::RECORD_OPTIONS, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["years"], json!([2024, 2022]));
        assert_eq!(res.body["statuses"].as_array().unwrap().len(), 4);
        assert_eq!(res.body["ipClasses"][0]["id"], 30);
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.get_with_token(&routes::record(9999), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod certificates {
    use super::*;

    #[tokio::test]
    async fn uploaded_certificate_is_downloadable_through_a_signed_url() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        let form = record_form(&reference, "Produk", "UD Maju", reference.status_accepted)
            .part("file", pdf_part("sertifikat.pdf"));
        let created = app.post_form_with_token(routes::RECORDS, form, &token).await;
        assert_eq!(created.status, 201, "{}", created.text);
        let path = created.body["certificatePath"].as_str().unwrap();
        assert!(path.starts_with("certificates/"));
        assert!(path.ends_with(".pdf"));

        let signed = app
            .get_with_token(&routes::certificate_url(created.id()), &token)
            .await;
        assert_eq!(signed.status, 200, "{}", signed.text);
        assert_eq!(signed.body["expiresInSeconds"], 300);

        let download = app
            .get_absolute(signed.body["signedUrl"].as_str().unwrap())
            .await;
        assert_eq!(download.status, 200);
        assert_eq!(download.header("content-type"), "application/pdf");
        assert!(download.text.starts_with("%PDF-1.4"));
    }

    #[tokio::test]
    async fn record_without_certificate_has_no_url() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;
        let id = app
            .create_record(&token, &reference, "Produk", "UD Maju", reference.status_accepted)
            .await;

        let res = app.get_with_token(&routes::certificate_url(id), &token).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn replacing_a_certificate_removes_the_old_blob() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        let form = record_form(&reference, "Produk", "UD Maju", reference.status_accepted)
            .part("file", pdf_part("lama.pdf"));
        let created = app.post_form_with_token(routes::RECORDS, form, &token).await;
        assert_eq!(created.status, 201, "{}", created.text);
        let old_path = created.body["certificatePath"].as_str().unwrap().to_string();
        assert_eq!(app.blob_count(), 1);

        let form = record_form(&reference, "Produk", "UD Maju", reference.status_rejected)
            .part("file", pdf_part("baru.pdf"));
        let updated = app
            .patch_form_with_token(&routes::record(created.id()), form, &token)
            .await;

        assert_eq!(updated.status, 200, "{}", updated.text);
        assert_eq!(updated.body["status"]["name"], "Ditolak");
        let new_path = updated.body["certificatePath"].as_str().unwrap();
        assert_ne!(new_path, old_path);
        assert_eq!(app.blob_count(), 1);
        assert!(!app.blob_root.join(&old_path).exists());
        assert!(app.blob_root.join(new_path).exists());
    }

    #[tokio::test]
    async fn update_without_a_file_keeps_the_certificate() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        let form = record_form(&reference, "Produk", "UD Maju", reference.status_accepted)
            .part("file", pdf_part("sertifikat.pdf"));
        let created = app.post_form_with_token(routes::RECORDS, form, &token).await;
        assert_eq!(created.status, 201, "{}", created.text);

        let form = record_form(&reference, "Produk Baru", "UD Maju", reference.status_accepted);
        let updated = app
            .patch_form_with_token(&routes::record(created.id()), form, &token)
            .await;

        assert_eq!(updated.status, 200, "{}", updated.text);
        assert_eq!(updated.body["title"], "Produk Baru");
        assert_eq!(updated.body["certificatePath"], created.body["certificatePath"]);
    }

    #[tokio::test]
    async fn remove_certificate_flag_clears_the_blob() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        let form = record_form(&reference, "Produk", "UD Maju", reference.status_accepted)
            .part("file", pdf_part("sertifikat.pdf"));
        let created = app.post_form_with_token(routes::RECORDS, form, &token).await;
        assert_eq!(created.status, 201, "{}", created.text);

        let form = record_form(&reference, "Produk", "UD Maju", reference.status_accepted)
            .text("removeCertificate", "true");
        let updated = app
            .patch_form_with_token(&routes::record(created.id()), form, &token)
            .await;

        assert_eq!(updated.status, 200, "{}", updated.text);
        assert!(updated.body["certificatePath"].is_null());
        assert_eq!(app.blob_count(), 0);
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn deleting_a_record_removes_its_certificate() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        let form = record_form(&reference, "Produk", "UD Maju", reference.status_accepted)
            .part("file", pdf_part("sertifikat.pdf"));
        let created = app.post_form_with_token(routes::RECORDS, form, &token).await;
        assert_eq!(created.status, 201, "{}", created.text);

        let res = app
            .delete_with_token(&routes::record(created.id()), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["deletedId"], created.id());
        assert_eq!(res.body["warnings"], json!([]));
        assert_eq!(app.blob_count(), 0);

        let gone = app.get_with_token(&routes::record(created.id()), &token).await;
        assert_eq!(gone.status, 404);
    }

    #[tokio::test]
    async fn deleting_a_missing_record_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.delete_with_token(&routes::record(9999), &token).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn bulk_delete_skips_unknown_ids() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let reference = app.seed_reference(&token).await;

        let a = app
            .create_record(&token, &reference, "A", "UD Maju", reference.status_accepted)
            .await;
        let b = app
            .create_record(&token, &reference, "B", "UD Maju", reference.status_accepted)
            .await;
        let keep = app
            .create_record(&token, &reference, "C", "UD Maju", reference.status_accepted)
            .await;

        let res = app
            .post_with_token(
                routes::RECORDS_BULK_DELETE,
                &json!({"ids": [a, b, 9999]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let mut deleted: Vec<i64> = res.body["deletedIds"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect();
        deleted.sort();
        assert_eq!(deleted, [a as i64, b as i64]);

        let list = app.get_with_token(routes::RECORDS, &token).await;
        assert_eq!(list.body["totalCount"], 1);
        assert_eq!(list.body["records"][0]["id"], keep);
    }

    #[tokio::test]
    async fn bulk_delete_rejects_an_empty_id_list() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(routes::RECORDS_BULK_DELETE, &json!({"ids": []}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
