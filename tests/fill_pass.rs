use std::sync::Arc;

use formfuse_cli::{
    handle, CollectingEvents, FillEngine, FillResponse, TriggerRequest, TriggerResponse,
    PROFILE_UNAVAILABLE, TRIGGER_ID,
};
use formfuse_profile::{sanitize, MemoryProfileStore};
use perceiver_form::{dom, HostDocument, PageDom};
use serde_json::json;
use tool_fill::{Decision, SkipReason};

const APPLICATION: &str = r#"
<html><body>
<form id="application">
  <div class="form-group">
    <label for="first">First Name</label>
    <input id="first" name="first_name" autocomplete="given-name">
  </div>
  <div class="form-group">
    <label for="mail">Email Address</label>
    <input id="mail" type="email" name="email">
  </div>
  <div class="form-group">
    <label for="cl">Cover Letter</label>
    <p>Tell us about your experience.</p>
    <textarea id="cl" name="cover_letter"></textarea>
  </div>
  <fieldset>
    <legend>Are you legally authorized to work in the United States?</legend>
    <label><input type="radio" name="auth" value="Yes"> Yes</label>
    <label><input type="radio" name="auth" value="No"> No</label>
  </fieldset>
  <div class="application-question">
    <div>What is your gender identity?</div>
    <div role="radiogroup">
      <div role="radio" id="man" aria-checked="false">Man</div>
      <div role="radio" id="woman" aria-checked="false">Woman</div>
    </div>
  </div>
  <input type="hidden" name="csrf" value="t0k3n">
  <input type="submit" value="Apply">
</form>
</body></html>
"#;

fn store(profile: serde_json::Value) -> MemoryProfileStore {
    MemoryProfileStore::from_json(&profile)
}

fn applicant() -> MemoryProfileStore {
    store(json!({
        "identity": { "first_name": "Jane", "email": "jane@x.com" },
        "work_auth": { "eligible_to_work_us": "yes" },
        "demographics": { "gender": "Female" }
    }))
}

fn radio(page: &PageDom, name: &str, value: &str) -> perceiver_form::NodeId {
    dom::interactive_controls(page)
        .into_iter()
        .find(|id| page.attr(*id, "name") == Some(name) && page.attr(*id, "value") == Some(value))
        .unwrap()
}

#[tokio::test]
async fn fills_email_and_leaves_cover_letter_alone() {
    let mut page = PageDom::from_html(
        r#"<div class="form-group">
             <label for="mail">Email Address</label><input id="mail" type="email">
           </div>
           <div class="form-group">
             <label for="cl">Cover Letter</label>
             <p>Describe your relevant experience.</p>
             <textarea id="cl"></textarea>
           </div>"#,
    );
    let engine = FillEngine::default();
    let response = engine
        .run_fill(&mut page, &store(json!({ "identity": { "email": "jane@x.com" } })))
        .await;

    assert!(response.ok);
    assert_eq!(response.scanned, 2);
    assert_eq!(response.filled, 1);
    assert_eq!(response.skipped, 1);
    let mail = page.by_id("mail").unwrap();
    let letter = page.by_id("cl").unwrap();
    assert_eq!(page.value(mail), "jane@x.com");
    assert_eq!(page.value(letter), "");
    assert!(page.events_for(letter).is_empty());
}

#[tokio::test]
async fn full_page_pass_then_idempotent_rerun() {
    let mut page = PageDom::from_html(APPLICATION);
    let events = Arc::new(CollectingEvents::new());
    let engine = FillEngine::default().with_events(events.clone());
    let store = applicant();

    let first = engine.run_fill(&mut page, &store).await;
    assert_eq!(
        first,
        FillResponse {
            ok: true,
            scanned: 9,
            matched: 4,
            filled: 4,
            skipped: 5,
            error: None,
        }
    );
    assert_eq!(page.value(page.by_id("first").unwrap()), "Jane");
    assert!(page.checked(radio(&page, "auth", "Yes")));
    assert_eq!(page.attr(page.by_id("woman").unwrap(), "aria-checked"), Some("true"));
    assert_eq!(page.attr(page.by_id("man").unwrap(), "aria-checked"), Some("false"));
    assert_eq!(events.take().len(), 9);

    let second = engine.run_fill(&mut page, &store).await;
    assert!(second.ok);
    assert_eq!(second.filled, 0);
    assert_eq!(second.matched, 0);
    assert_eq!(second.scanned, second.filled + second.skipped);
    let answered = events
        .take()
        .into_iter()
        .filter(|r| {
            r.decision
                == Decision::Skipped {
                    reason: SkipReason::AlreadyAnswered,
                }
        })
        .count();
    assert_eq!(answered, 4);
}

#[tokio::test]
async fn blank_profile_values_touch_nothing() {
    let mut page = PageDom::from_html(APPLICATION);
    let profile = json!({ "identity": { "first_name": "   " } });
    let engine = FillEngine::default();

    let response = engine.run_fill(&mut page, &store(profile)).await;

    assert!(response.ok);
    let first = page.by_id("first").unwrap();
    let mail = page.by_id("mail").unwrap();
    assert_eq!(page.value(first), "");
    assert_eq!(page.value(mail), "");
    assert!(page.events_for(first).is_empty());
    assert!(!page.checked(radio(&page, "auth", "Yes")));
    assert!(!page.checked(radio(&page, "auth", "No")));
    assert_eq!(response.scanned, response.filled + response.skipped);
}

#[tokio::test]
async fn unreadable_profile_fails_the_pass_without_mutation() {
    let mut page = PageDom::from_html(APPLICATION);
    let before = page.to_html();
    let engine = FillEngine::default();

    let response = engine
        .run_fill(&mut page, &MemoryProfileStore::unavailable())
        .await;

    assert!(!response.ok);
    assert_eq!(response.error.as_deref(), Some(PROFILE_UNAVAILABLE));
    assert_eq!(response.scanned, 0);
    assert_eq!(page.to_html(), before);
    assert!(page.events().is_empty());
}

#[tokio::test]
async fn one_decision_per_radio_question() {
    let mut page = PageDom::from_html(
        r#"<fieldset>
             <legend>Are you willing to relocate for this role?</legend>
             <label><input type="radio" name="relo" value="maybe"> Maybe</label>
             <label><input type="radio" name="relo" value="no"> No</label>
             <label><input type="radio" name="relo" value="yes"> Yes</label>
           </fieldset>"#,
    );
    let events = Arc::new(CollectingEvents::new());
    let engine = FillEngine::default().with_events(events.clone());
    let profile = store(json!({ "work_auth": { "open_to_relocate": "Yes" } }));

    let response = engine.run_fill(&mut page, &profile).await;

    assert_eq!(response.scanned, 3);
    assert_eq!(response.matched, 1);
    assert_eq!(response.filled, 1);
    assert!(page.checked(radio(&page, "relo", "yes")));
    let reports = events.take();
    let visited = reports
        .iter()
        .filter(|r| {
            r.decision
                == Decision::Skipped {
                    reason: SkipReason::GroupVisited,
                }
        })
        .count();
    assert_eq!(visited, 2);
    assert!(reports
        .iter()
        .all(|r| r.path.as_deref() == Some("work_auth.open_to_relocate")));
}

const COUNTRY_PAGE: &str = r#"
<div class="form-group">
  <label for="country">Country</label>
  <select id="country" name="country">
    <option value="">Select...</option>
    <option value="US" selected>United States</option>
    <option value="CA">Canada</option>
  </select>
</div>"#;

#[tokio::test]
async fn country_default_yields_only_to_a_different_country() {
    let engine = FillEngine::default();

    let mut page = PageDom::from_html(COUNTRY_PAGE);
    let same = store(json!({ "address": { "country": "United States" } }));
    let response = engine.run_fill(&mut page, &same).await;
    let country = page.by_id("country").unwrap();
    assert_eq!(response.filled, 0);
    assert_eq!(page.value(country), "US");
    assert!(page.events_for(country).is_empty());

    let mut page = PageDom::from_html(COUNTRY_PAGE);
    let other = store(json!({ "address": { "country": "Canada" } }));
    let response = engine.run_fill(&mut page, &other).await;
    assert_eq!(response.filled, 1);
    assert_eq!(page.value(country), "CA");
}

#[tokio::test]
async fn trigger_toggle_is_idempotent_and_not_scanned() {
    let mut page = PageDom::from_html(APPLICATION);
    let engine = FillEngine::default();
    let store = applicant();
    let trigger_count = |page: &PageDom| {
        dom::element_descendants(page, page.root())
            .into_iter()
            .filter(|id| page.attr(*id, "id") == Some(TRIGGER_ID))
            .count()
    };

    for _ in 0..2 {
        let response = handle(
            &engine,
            &mut page,
            &store,
            TriggerRequest::ToggleTrigger { visible: true },
        )
        .await;
        assert!(matches!(
            response,
            TriggerResponse::Trigger {
                ok: true,
                trigger_visible: true,
                ..
            }
        ));
    }
    assert_eq!(trigger_count(&page), 1);

    let filled = handle(&engine, &mut page, &store, TriggerRequest::Fill).await;
    match filled {
        TriggerResponse::Fill(response) => assert_eq!(response.scanned, 9),
        other => panic!("unexpected response {other:?}"),
    }

    for _ in 0..2 {
        handle(
            &engine,
            &mut page,
            &store,
            TriggerRequest::ToggleTrigger { visible: false },
        )
        .await;
    }
    assert_eq!(trigger_count(&page), 0);
}

#[test]
fn sanitized_profile_feeds_the_engine_defaults() {
    let profile = sanitize(&json!({ "demographics": { "gender": "" } }));
    assert_eq!(profile.get("demographics.gender"), Some("prefer_not_to_say"));
    assert_eq!(profile.get("address.country"), Some("United States"));
}

#[tokio::test]
async fn neighbouring_question_never_lends_its_attribute() {
    let mut page = PageDom::from_html(
        r#"<form>
             <fieldset>
               <legend>Will you now or in the future require visa sponsorship?</legend>
               <label><input type="radio" name="sponsor" value="yes"> Yes</label>
               <label><input type="radio" name="sponsor" value="no"> No</label>
             </fieldset>
             <fieldset>
               <legend>Are you at least 18 years of age?</legend>
               <label><input type="radio" name="age" value="yes"> Yes</label>
               <label><input type="radio" name="age" value="no"> No</label>
             </fieldset>
           </form>"#,
    );
    let engine = FillEngine::default();
    let plans = engine.plan(&page);
    let age_paths: Vec<Option<String>> = plans
        .iter()
        .filter(|plan| page.attr(plan.control, "name") == Some("age"))
        .map(|plan| plan.path.clone())
        .collect();
    assert_eq!(age_paths, vec![None, None]);

    let profile = store(json!({ "work_auth": { "requires_sponsorship": "no" } }));
    let response = engine.run_fill(&mut page, &profile).await;

    assert_eq!(response.scanned, 4);
    assert_eq!(response.filled, 1);
    assert!(page.checked(radio(&page, "sponsor", "no")));
    for value in ["yes", "no"] {
        let age = radio(&page, "age", value);
        assert!(!page.checked(age));
        assert!(page.events_for(age).is_empty());
    }
}

#[tokio::test]
async fn plain_yes_no_buttons_are_filled_once() {
    let mut page = PageDom::from_html(
        r#"<div class="application-question">
             <p>Are you open to relocation?</p>
             <button type="button">Yes</button>
             <button type="button">No</button>
           </div>"#,
    );
    let engine = FillEngine::default();
    let profile = store(json!({ "work_auth": { "open_to_relocate": "yes" } }));

    let first = engine.run_fill(&mut page, &profile).await;
    assert_eq!(first.scanned, 2);
    assert_eq!(first.filled, 1);
    let buttons: Vec<_> = dom::element_descendants(&page, page.root())
        .into_iter()
        .filter(|id| dom::is_tag(&page, *id, "button"))
        .collect();
    assert_eq!(page.attr(buttons[0], "aria-pressed"), Some("true"));
    assert!(page.events_for(buttons[0]).contains(&perceiver_form::DomEvent::Click));
    assert!(page.events_for(buttons[1]).is_empty());

    let second = engine.run_fill(&mut page, &profile).await;
    assert_eq!(second.scanned, 2);
    assert_eq!(second.filled, 0);
}
