mod helpers;

use std::sync::Arc;

use chrono::NaiveDate;
use helpers::{calls, engine, extractor, insert_many, test_db};
use lema::agent::{AnalyticsAgent, NO_TOPIC_REPLY};
use lema::extract::ExtractionMethod;
use lema::session::{Role, SessionStore};

fn march_15() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn seeded_agent(reply: Option<&str>) -> (AnalyticsAgent, Arc<std::sync::atomic::AtomicUsize>) {
    let conn = test_db();
    insert_many(&conn, "alq", 5, "2024-03-02", "alquiler", "alquiler", "ana", 150.0);
    insert_many(&conn, "hip", 2, "2024-03-05", "hipoteca", "pago", "luis", 80.0);

    let (extractor, counter) = extractor(reply);
    let agent = AnalyticsAgent::new(extractor, engine(conn), Arc::new(SessionStore::new(4)));
    (agent, counter)
}

#[test]
fn cache_hit_resolves_current_month_without_model() {
    let (extractor, counter) = extractor(Some(r#"{"topic": "otro"}"#));

    let result = extractor.extract_at("¿Cuántos casos de alquiler hay este mes?", march_15());

    assert_eq!(result.topic.as_deref(), Some("alquiler"));
    assert_eq!(result.method, ExtractionMethod::Cache);
    assert_eq!(result.confidence, 1.0);
    let period = result.period.unwrap();
    assert_eq!(period.value(), "2024-03");
    assert!(period.filter_predicate().contains("2024-03"));
    assert_eq!(calls(&counter), 0);
}

#[test]
fn cache_lookup_is_case_insensitive_and_deterministic() {
    let (extractor, _) = extractor(None);
    for _ in 0..3 {
        let lower = extractor.extract_at("demandas pendientes", march_15());
        let upper = extractor.extract_at("DEMANDAS PENDIENTES", march_15());
        assert_eq!(lower.topic.as_deref(), Some("juicio"));
        assert_eq!(lower, upper);
    }
}

#[test]
fn ask_answers_and_records_the_conversation() {
    let (agent, counter) = seeded_agent(None);

    let response = agent.ask_at("s1", "¿Cuántos casos de alquiler hay este mes?", march_15());

    assert!(response.success);
    assert_eq!(response.topic.as_deref(), Some("alquiler"));
    assert!(response.reply.contains("**Total de casos encontrados:** 5"));
    assert!(response.query.unwrap().contains(":periodo_inicio"));
    assert_eq!(calls(&counter), 0);

    let history = agent.sessions().history("s1", None);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Agent);

    let context = agent.sessions().context("s1");
    assert_eq!(context.last_topic.as_deref(), Some("alquiler"));
    assert_eq!(context.last_period.unwrap().value(), "2024-03");
}

#[test]
fn model_topic_flows_through_to_analysis() {
    let (agent, counter) = seeded_agent(Some(r#"```json
{"topic": "Hipoteca", "confidence": 0.85}
```"#));

    let response = agent.ask_at("s1", "¿qué pasa con las hipotecas en marzo?", march_15());

    assert!(response.success, "{}", response.reply);
    assert_eq!(response.method, ExtractionMethod::Llm);
    assert_eq!(response.topic.as_deref(), Some("hipoteca"));
    assert_eq!(response.confidence, 0.85);
    assert_eq!(calls(&counter), 1);
}

#[test]
fn unidentifiable_question_gets_guidance() {
    let (agent, counter) = seeded_agent(None);

    let response = agent.ask_at("s1", "hola, ¿cómo estás?", march_15());

    assert!(!response.success);
    assert_eq!(response.method, ExtractionMethod::Fallback);
    assert_eq!(response.reply, NO_TOPIC_REPLY);
    assert_eq!(calls(&counter), 1);
    assert!(agent.sessions().history("s1", None).is_empty());
}

#[test]
fn topic_without_data_suggests_alternatives() {
    let (agent, _) = seeded_agent(None);

    let response = agent.ask_at("s1", "casos de juicio del mes", march_15());

    assert!(!response.success);
    assert_eq!(
        response.reply,
        "No encontré datos para 'juicio'. Intenta con: juicio, alquiler, pago, trabajo, deuda."
    );
}

#[test]
fn session_history_stays_bounded_across_questions() {
    let (agent, _) = seeded_agent(None);

    for _ in 0..3 {
        assert!(agent.ask_at("s1", "alquileres este mes", march_15()).success);
    }

    let history = agent.sessions().history("s1", None);
    assert_eq!(history.len(), 4);
    assert_eq!(history.first().unwrap().role, Role::User);
    assert_eq!(history.last().unwrap().role, Role::Agent);
}
