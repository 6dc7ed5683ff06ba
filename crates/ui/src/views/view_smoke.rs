use survey_core::model::{AgeGroup, Gender, RespondentIdentity};

use super::test_harness::{Seed, setup_view_harness};

fn identity() -> RespondentIdentity {
    RespondentIdentity::new("Aiko", AgeGroup::Thirties, Gender::Female).unwrap()
}

fn row(file: &str, rating: &str) -> Vec<String> {
    ["t", "Aiko", "30-39", "Female", "1", file, rating]
        .iter()
        .map(|c| (*c).to_string())
        .collect()
}

#[tokio::test(flavor = "current_thread")]
async fn empty_directory_renders_no_photos() {
    let mut harness = setup_view_harness(Seed {
        images: &[],
        identity: Some(identity()),
        ..Seed::default()
    });
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("No photos were found."), "missing empty state in {html}");
    assert!(!html.contains("Before we start"), "intake shown in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn new_respondent_sees_intake_form() {
    let mut harness = setup_view_harness(Seed {
        images: &["a.jpg"],
        ..Seed::default()
    });
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Before we start"), "missing intake in {html}");
    assert!(html.contains("Select your age group"), "missing sentinel in {html}");
    assert!(html.contains("60+"), "missing age option in {html}");
    assert!(html.contains("Female"), "missing gender option in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn returning_respondent_resumes_at_first_unrated_photo() {
    let mut harness = setup_view_harness(Seed {
        images: &["a.jpg", "b.jpg", "c.jpg"],
        ledger: vec![row("a.jpg", "3"), row("b.jpg", "5")],
        identity: Some(identity()),
        ..Seed::default()
    });
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("3 / 3"), "missing caption in {html}");
    assert!(html.contains("alt=\"c.jpg\""), "wrong photo in {html}");
    assert!(html.contains("data:image/jpeg;base64,"), "missing inline image in {html}");
    for id in ["rating-1", "rating-5"] {
        assert!(html.contains(id), "missing {id} in {html}");
    }
}

#[tokio::test(flavor = "current_thread")]
async fn fully_rated_respondent_sees_completion() {
    let mut harness = setup_view_harness(Seed {
        images: &["a.jpg"],
        ledger: vec![row("a.jpg", "4")],
        identity: Some(identity()),
        ..Seed::default()
    });
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("All photos rated"), "missing completion in {html}");
    assert_eq!(harness.ledger.rows().unwrap().len(), 1);
}

fn shown_photo(html: &str) -> Option<String> {
    let start = html.find("alt=\"")? + "alt=\"".len();
    let len = html[start..].find('"')?;
    Some(html[start..start + len].to_string())
}

#[tokio::test(flavor = "current_thread")]
async fn shuffled_photo_stays_put_across_renders() {
    let names: Vec<String> = (0..8).map(|i| format!("p{i}.jpg")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut harness = setup_view_harness(Seed {
        images: &refs,
        identity: Some(identity()),
        shuffled: true,
        ..Seed::default()
    });
    harness.settle().await;
    let first = harness.render();
    let photo = shown_photo(&first).expect("a photo is shown");
    assert!(names.contains(&photo), "unknown photo {photo}");
    assert!(first.contains("1 / 8"), "missing caption in {first}");

    for _ in 0..3 {
        harness.drive_async().await;
        let html = harness.render();
        assert_eq!(shown_photo(&html).as_deref(), Some(photo.as_str()));
    }
}
