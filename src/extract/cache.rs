//! Known-vocabulary topic cache.
//!
//! Maps canonical topics to the variant spellings that identify them. Lookup is a
//! case-insensitive substring scan in insertion order, so it is deterministic and
//! never leaves the process.

/// Default vocabulary of collection-call topics, in lookup order.
const DEFAULT_TOPICS: &[(&str, &[&str])] = &[
    ("alquiler", &["alquileres", "renta", "arriendo", "alquilar"]),
    (
        "juicio",
        &["juicios", "demanda", "demandas", "legal", "abogado", "judicial"],
    ),
    (
        "pago",
        &["pagos", "pagar", "abonar", "cancelar", "saldar", "abono"],
    ),
    (
        "trabajo",
        &["empleo", "desempleo", "laboral", "trabajando", "empleado"],
    ),
    (
        "deuda",
        &["deudas", "debe", "adeuda", "prestamo", "crédito", "préstamo"],
    ),
    (
        "telefono",
        &["teléfono", "llamada", "llamadas", "contacto", "comunicación"],
    ),
    (
        "promesa",
        &["promesas", "compromiso", "comprometió", "acordar"],
    ),
];

#[derive(Debug, Clone)]
struct CacheEntry {
    topic: String,
    variants: Vec<String>,
}

/// Ordered canonical-topic → variants table.
#[derive(Debug, Clone)]
pub struct TopicCache {
    entries: Vec<CacheEntry>,
}

impl Default for TopicCache {
    fn default() -> Self {
        let mut cache = Self::empty();
        for (topic, variants) in DEFAULT_TOPICS {
            cache.insert(topic, variants.iter().copied());
        }
        cache
    }
}

impl TopicCache {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `topic` with its variants. Both are stored lowercased. Registering
    /// an existing topic extends its variant list and keeps its position.
    pub fn insert<'a>(&mut self, topic: &str, variants: impl IntoIterator<Item = &'a str>) {
        let topic = topic.trim().to_lowercase();
        let variants = variants.into_iter().map(|v| v.trim().to_lowercase());

        match self.entries.iter_mut().find(|e| e.topic == topic) {
            Some(entry) => entry.variants.extend(variants),
            None => self.entries.push(CacheEntry {
                topic,
                variants: variants.collect(),
            }),
        }
    }

    /// First canonical topic whose name or any variant occurs in `question`.
    pub fn lookup(&self, question: &str) -> Option<&str> {
        let lower = question.to_lowercase();
        self.entries
            .iter()
            .find(|entry| {
                entry
                    .variants
                    .iter()
                    .chain(std::iter::once(&entry.topic))
                    .any(|variant| !variant.is_empty() && lower.contains(variant.as_str()))
            })
            .map(|entry| entry.topic.as_str())
    }

    /// Canonical topic for an exact word, if the word is the topic or one of its variants.
    pub fn canonical(&self, word: &str) -> Option<&str> {
        let lower = word.trim().to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.topic == lower || entry.variants.iter().any(|v| *v == lower))
            .map(|entry| entry.topic.as_str())
    }

    /// Canonical topics in lookup order.
    pub fn topics(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.topic.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
