use lema::extract::TopicCache;

/// List the topics recognized without a model call.
pub fn topics() {
    let cache = TopicCache::default();
    println!("Lemas disponibles ({}):", cache.len());
    for topic in cache.topics() {
        println!("  {topic}");
    }
}
