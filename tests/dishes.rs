mod common;

use axum::http::StatusCode;
use common::{assert_error, body_json, dish_payload, TestApp};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn create_then_fetch_applies_defaults() {
    let app = TestApp::new().await;

    let resp = app
        .send_json(
            "POST",
            "/api/dishes",
            &json!({
                "name": "番茄炒蛋",
                "ingredients": ["鸡蛋", "番茄"],
                "instructions": ["打蛋", "炒制"],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    let id = created["id"].as_i64().unwrap();
    assert!(id > 0);
    assert!(created["message"].is_string());

    let resp = app.get(&format!("/api/dishes/{id}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let dish = body_json(resp).await;
    assert_eq!(dish["id"], id);
    assert_eq!(dish["name"], "番茄炒蛋");
    assert_eq!(dish["difficulty"], 1);
    assert_eq!(dish["cooking_time"], 30);
    assert_eq!(dish["servings"], 2);
    assert_eq!(dish["category"], "家常菜");
    assert_eq!(dish["tags"], json!([]));
    assert_eq!(dish["ingredients"], json!(["鸡蛋", "番茄"]));
    assert_eq!(dish["instructions"], json!(["打蛋", "炒制"]));
    assert_eq!(dish["image"], "");
    assert_eq!(dish["tutorial_url"], "");
    assert_eq!(dish["created_at"], dish["updated_at"]);
}

#[tokio::test]
async fn create_without_name_lists_the_violation() {
    let app = TestApp::new().await;

    let resp = app
        .send_json(
            "POST",
            "/api/dishes",
            &json!({ "ingredients": ["盐"], "instructions": ["撒盐"] }),
        )
        .await;
    let error = assert_error(resp, StatusCode::BAD_REQUEST, "VALIDATION_FAILED").await;
    assert_eq!(error["details"]["fields"], json!(["name is required"]));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM dishes")
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn create_reports_every_violation() {
    let app = TestApp::new().await;

    let resp = app
        .send_json(
            "POST",
            "/api/dishes",
            &json!({
                "name": " ",
                "ingredients": ["  "],
                "instructions": [],
                "difficulty": 6,
                "cooking_time": 1441,
                "servings": 0,
            }),
        )
        .await;
    let error = assert_error(resp, StatusCode::BAD_REQUEST, "VALIDATION_FAILED").await;
    assert_eq!(error["details"]["fields"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn non_json_body_is_a_validation_error() {
    let app = TestApp::new().await;

    let resp = app.send_raw("POST", "/api/dishes", "{oops".to_string()).await;
    let error = assert_error(resp, StatusCode::BAD_REQUEST, "VALIDATION_FAILED").await;
    assert_eq!(
        error["details"]["fields"],
        json!(["request body must be a JSON object"])
    );
}

#[tokio::test]
async fn boundary_values_are_accepted() {
    let app = TestApp::new().await;

    let mut payload = dish_payload("边界");
    payload["difficulty"] = json!(5);
    payload["cooking_time"] = json!(1440);
    payload["servings"] = json!(50);
    let id = app.create_dish(payload).await;

    let dish = body_json(app.get(&format!("/api/dishes/{id}")).await).await;
    assert_eq!(dish["difficulty"], 5);
    assert_eq!(dish["cooking_time"], 1440);
    assert_eq!(dish["servings"], 50);
}

#[tokio::test]
async fn get_with_malformed_id_is_bad_request() {
    let app = TestApp::new().await;

    for id in ["abc", "0", "-1", "1.5"] {
        let resp = app.get(&format!("/api/dishes/{id}")).await;
        assert_error(resp, StatusCode::BAD_REQUEST, "INVALID_ID").await;
    }
}

#[tokio::test]
async fn get_missing_dish_is_not_found() {
    let app = TestApp::new().await;

    let resp = app.get("/api/dishes/999").await;
    assert_error(resp, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[tokio::test]
async fn list_is_empty_array_when_no_dishes() {
    let app = TestApp::new().await;

    let resp = app.get("/api/dishes").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn search_matches_name_ingredients_and_instructions() {
    let app = TestApp::new().await;

    app.create_dish(json!({
        "name": "番茄炒蛋",
        "ingredients": ["鸡蛋"],
        "instructions": ["炒"],
    }))
    .await;
    app.create_dish(json!({
        "name": "罗宋汤",
        "ingredients": ["牛肉", "番茄"],
        "instructions": ["炖"],
    }))
    .await;
    app.create_dish(json!({
        "name": "意面",
        "ingredients": ["面条"],
        "instructions": ["加入番茄酱拌匀"],
    }))
    .await;
    app.create_dish(json!({
        "name": "清蒸鱼",
        "ingredients": ["鱼"],
        "instructions": ["蒸"],
    }))
    .await;

    let resp = app.get("/api/dishes?search=%E7%95%AA%E8%8C%84").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let dishes = body_json(resp).await;
    let mut names: Vec<&str> = dishes
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["意面", "番茄炒蛋", "罗宋汤"]);
}

#[tokio::test]
async fn search_is_case_insensitive() {
    let app = TestApp::new().await;
    app.create_named_dish("Caesar Salad").await;

    let dishes = body_json(app.get("/api/dishes?search=caesar").await).await;
    assert_eq!(dishes.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn category_and_tag_filters() {
    let app = TestApp::new().await;

    let mut spicy = dish_payload("宫保鸡丁");
    spicy["category"] = json!("川菜");
    spicy["tags"] = json!(["辣", "经典"]);
    app.create_dish(spicy).await;
    app.create_named_dish("番茄炒蛋").await;

    let all = body_json(app.get("/api/dishes").await).await;
    let all_category = body_json(app.get("/api/dishes?category=all").await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    assert_eq!(all, all_category);

    let sichuan = body_json(app.get("/api/dishes?category=%E5%B7%9D%E8%8F%9C").await).await;
    assert_eq!(sichuan.as_array().unwrap().len(), 1);
    assert_eq!(sichuan[0]["name"], "宫保鸡丁");

    let tagged = body_json(app.get("/api/dishes?tag=%E8%BE%A3").await).await;
    assert_eq!(tagged.as_array().unwrap().len(), 1);
    assert_eq!(tagged[0]["tags"], json!(["辣", "经典"]));
}

#[tokio::test]
async fn list_orders_by_most_recently_updated() {
    let app = TestApp::new().await;

    let first = app.create_named_dish("第一道").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = app.create_named_dish("第二道").await;

    let dishes = body_json(app.get("/api/dishes").await).await;
    assert_eq!(dishes[0]["id"], second);
    assert_eq!(dishes[1]["id"], first);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let resp = app
        .send_json("PUT", &format!("/api/dishes/{first}"), &dish_payload("第一道改"))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let dishes = body_json(app.get("/api/dishes").await).await;
    assert_eq!(dishes[0]["id"], first);
    assert_eq!(dishes[0]["name"], "第一道改");
}

#[tokio::test]
async fn ties_on_updated_at_break_by_id() {
    let app = TestApp::new().await;

    let a = app.create_named_dish("甲").await;
    let b = app.create_named_dish("乙").await;
    sqlx::query("UPDATE dishes SET updated_at = '2024-01-01T00:00:00.000Z'")
        .execute(&app.db)
        .await
        .unwrap();

    let dishes = body_json(app.get("/api/dishes").await).await;
    assert_eq!(dishes[0]["id"], b);
    assert_eq!(dishes[1]["id"], a);
}

#[tokio::test]
async fn update_replaces_all_fields_and_bumps_updated_at() {
    let app = TestApp::new().await;

    let mut payload = dish_payload("番茄炒蛋");
    payload["tags"] = json!(["简单"]);
    payload["image"] = json!("https://img.example/egg.jpg");
    let id = app.create_dish(payload).await;
    let before = body_json(app.get(&format!("/api/dishes/{id}")).await).await;

    tokio::time::sleep(Duration::from_millis(5)).await;
    let resp = app
        .send_json(
            "PUT",
            &format!("/api/dishes/{id}"),
            &json!({
                "name": "西红柿炒鸡蛋",
                "category": "快手菜",
                "difficulty": 2,
                "cooking_time": 10,
                "servings": 3,
                "ingredients": ["鸡蛋 4个", "西红柿 2个"],
                "instructions": ["炒蛋", "炒西红柿", "合炒"],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["message"].is_string());

    let after = body_json(app.get(&format!("/api/dishes/{id}")).await).await;
    assert_eq!(after["name"], "西红柿炒鸡蛋");
    assert_eq!(after["category"], "快手菜");
    assert_eq!(after["difficulty"], 2);
    assert_eq!(after["instructions"], json!(["炒蛋", "炒西红柿", "合炒"]));
    // full replacement: omitted optional fields are reset
    assert_eq!(after["tags"], json!([]));
    assert_eq!(after["image"], "");
    assert_eq!(after["created_at"], before["created_at"]);
    assert!(after["updated_at"].as_str().unwrap() > before["updated_at"].as_str().unwrap());
}

#[tokio::test]
async fn update_missing_dish_is_not_found() {
    let app = TestApp::new().await;

    let resp = app
        .send_json("PUT", "/api/dishes/4242", &dish_payload("不存在"))
        .await;
    assert_error(resp, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[tokio::test]
async fn update_validates_id_before_body() {
    let app = TestApp::new().await;

    let resp = app.send_json("PUT", "/api/dishes/nope", &json!({})).await;
    assert_error(resp, StatusCode::BAD_REQUEST, "INVALID_ID").await;

    let id = app.create_named_dish("番茄炒蛋").await;
    let resp = app
        .send_json("PUT", &format!("/api/dishes/{id}"), &json!({ "name": "x" }))
        .await;
    assert_error(resp, StatusCode::BAD_REQUEST, "VALIDATION_FAILED").await;
}

#[tokio::test]
async fn delete_removes_the_dish() {
    let app = TestApp::new().await;
    let id = app.create_named_dish("番茄炒蛋").await;

    let resp = app.delete(&format!("/api/dishes/{id}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["message"].is_string());

    let resp = app.get(&format!("/api/dishes/{id}")).await;
    assert_error(resp, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[tokio::test]
async fn delete_missing_dish_is_not_found() {
    let app = TestApp::new().await;

    let resp = app.delete("/api/dishes/77").await;
    assert_error(resp, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    let resp = app.delete("/api/dishes/abc").await;
    assert_error(resp, StatusCode::BAD_REQUEST, "INVALID_ID").await;
}

#[tokio::test]
async fn categories_are_distinct_sorted_and_non_blank() {
    let app = TestApp::new().await;

    for (name, category) in [("a", "川菜"), ("b", "川菜"), ("c", "粤菜"), ("d", "")] {
        let mut payload = dish_payload(name);
        payload["category"] = json!(category);
        app.create_dish(payload).await;
    }

    let resp = app.get("/api/dishes/categories").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let mut expected = vec!["川菜", "粤菜", "家常菜"];
    expected.sort();
    assert_eq!(body_json(resp).await, json!(expected));
}

#[tokio::test]
async fn malformed_stored_lists_read_as_empty() {
    let app = TestApp::new().await;
    let id = app.create_named_dish("坏数据").await;

    sqlx::query("UPDATE dishes SET tags = 'not json', instructions = '{\"a\":1}' WHERE id = ?")
        .bind(id)
        .execute(&app.db)
        .await
        .unwrap();

    let resp = app.get(&format!("/api/dishes/{id}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let dish = body_json(resp).await;
    assert_eq!(dish["tags"], json!([]));
    assert_eq!(dish["instructions"], json!([]));
}

#[tokio::test]
async fn search_does_not_match_list_encoding() {
    let app = TestApp::new().await;
    app.create_named_dish("番茄炒蛋").await;

    // `","` only occurs between the encoded elements of ingredients
    let resp = app.get("/api/dishes?search=%22%2C%22").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!([]));

    let hits = body_json(app.get("/api/dishes?search=%E9%B8%A1%E8%9B%8B").await).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn filters_skip_malformed_stored_lists() {
    let app = TestApp::new().await;
    let id = app.create_named_dish("坏数据").await;

    sqlx::query("UPDATE dishes SET tags = 'not json', instructions = '{\"a\":\"x\"}' WHERE id = ?")
        .bind(id)
        .execute(&app.db)
        .await
        .unwrap();

    let resp = app.get("/api/dishes?tag=not").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!([]));

    let resp = app.get("/api/dishes?search=x").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn undecodable_request_parts_use_the_error_shape() {
    let app = TestApp::new().await;

    let resp = app.get("/api/dishes?category=a&category=b").await;
    let error = assert_error(resp, StatusCode::BAD_REQUEST, "VALIDATION_FAILED").await;
    assert!(error["details"]["fields"][0].as_str().unwrap().contains("category"));

    let resp = app.get("/api/dishes/%FF").await;
    assert_error(resp, StatusCode::BAD_REQUEST, "INVALID_ID").await;

    let resp = app.send_json("PUT", "/api/dishes/%FF", &dish_payload("番茄炒蛋")).await;
    assert_error(resp, StatusCode::BAD_REQUEST, "INVALID_ID").await;

    let resp = app.delete("/api/dishes/%FF").await;
    assert_error(resp, StatusCode::BAD_REQUEST, "INVALID_ID").await;
}

/// Every store error reaches the caller as a 500 with the driver's cause.
async fn assert_store_error(resp: axum::response::Response, code: &str, cause: &str) {
    let error = assert_error(resp, StatusCode::INTERNAL_SERVER_ERROR, code).await;
    let reported = error["details"]["cause"].as_str().unwrap();
    assert!(reported.contains(cause), "cause was {reported}");
}

#[tokio::test]
async fn store_failures_map_to_operation_codes() {
    let app = TestApp::new().await;
    sqlx::query("DROP TABLE dishes").execute(&app.db).await.unwrap();

    let missing = "no such table: dishes";
    assert_store_error(app.get("/api/dishes").await, "QUERY_FAILED", missing).await;
    assert_store_error(app.get("/api/dishes/1").await, "QUERY_FAILED", missing).await;
    assert_store_error(app.get("/api/dishes/categories").await, "QUERY_FAILED", missing).await;

    let resp = app.send_json("POST", "/api/dishes", &dish_payload("番茄炒蛋")).await;
    assert_store_error(resp, "CREATE_FAILED", missing).await;

    let resp = app.send_json("PUT", "/api/dishes/1", &dish_payload("番茄炒蛋")).await;
    assert_store_error(resp, "UPDATE_FAILED", missing).await;

    assert_store_error(app.delete("/api/dishes/1").await, "DELETE_FAILED", missing).await;
}
