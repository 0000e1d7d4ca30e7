//! Integration tests for recommendation queries.
//!
//! These exercise the loader and the engine together on small catalogs and
//! check the behavioural guarantees callers rely on.

use data_loader::{Catalog, RawRecord, load_and_normalize};
use similarity::{
    FeatureCorpus, FeatureIndex, IndexCache, RecommendError, recommend, recommend_neighbors,
    recommend_with_index, resolve_title,
};

fn movie(title: &str, date: &str, keywords: &str) -> RawRecord {
    RawRecord::new(title, date).with_keywords(keywords)
}

fn alpha_beta_gamma() -> Catalog {
    load_and_normalize(vec![
        movie("Alpha", "2001", "spy action"),
        movie("Beta", "2002", "spy action"),
        movie("Gamma", "2003", "cooking"),
    ])
    .unwrap()
}

fn film_catalog() -> Catalog {
    load_and_normalize(vec![
        RawRecord::new("Heat", "1995")
            .with_keywords("heist robbery los-angeles detective")
            .with_actors("Al-Pacino Robert-De-Niro Val-Kilmer")
            .with_director("Michael-Mann")
            .with_genres("Action Crime Drama"),
        RawRecord::new("Collateral", "2004")
            .with_keywords("hitman taxi los-angeles night")
            .with_actors("Tom-Cruise Jamie-Foxx")
            .with_director("Michael-Mann")
            .with_genres("Action Crime Thriller"),
        RawRecord::new("Ronin", "1998")
            .with_keywords("heist mercenary car-chase")
            .with_actors("Robert-De-Niro Jean-Reno")
            .with_director("John-Frankenheimer")
            .with_genres("Action Crime Thriller"),
        RawRecord::new("Ratatouille", "2007")
            .with_keywords("cooking paris rat chef")
            .with_actors("Patton-Oswalt")
            .with_director("Brad-Bird")
            .with_genres("Animation Comedy Family"),
        RawRecord::new("Chef", "2014")
            .with_keywords("cooking food-truck chef")
            .with_actors("Jon-Favreau Scarlett-Johansson")
            .with_director("Jon-Favreau")
            .with_genres("Comedy Drama"),
        RawRecord::new("The Insider", "1999")
            .with_keywords("tobacco journalism whistleblower")
            .with_actors("Al-Pacino Russell-Crowe")
            .with_director("Michael-Mann")
            .with_genres("Drama Thriller"),
        RawRecord::new("Untitled", "2020"),
    ])
    .unwrap()
}

#[test]
fn test_alpha_beta_gamma_scenario() {
    let catalog = alpha_beta_gamma();
    let corpus = FeatureCorpus::from_catalog(&catalog);

    let result = recommend(&catalog, &corpus, "Alpha", 2).unwrap();
    assert_eq!(result, vec!["Beta".to_string(), "Gamma".to_string()]);
}

#[test]
fn test_unknown_title() {
    let catalog = alpha_beta_gamma();
    let corpus = FeatureCorpus::from_catalog(&catalog);

    let err = recommend(&catalog, &corpus, "Delta", 1).unwrap_err();
    assert_eq!(
        err,
        RecommendError::TitleNotFound {
            title: "Delta".to_string()
        }
    );
    // No fuzzy matching
    assert!(resolve_title(&catalog, "alpha").is_err());
    assert!(resolve_title(&catalog, "Alpha ").is_err());
}

#[test]
fn test_k_too_large() {
    let catalog = alpha_beta_gamma();
    let corpus = FeatureCorpus::from_catalog(&catalog);

    assert!(matches!(
        recommend(&catalog, &corpus, "Alpha", 5),
        Err(RecommendError::InsufficientData { requested: 5, .. })
    ));
    assert!(matches!(
        recommend(&catalog, &corpus, "Alpha", 3),
        Err(RecommendError::InsufficientData { .. })
    ));
}

#[test]
fn test_length_contract() {
    let catalog = film_catalog();
    let corpus = FeatureCorpus::from_catalog(&catalog);

    for k in 0..catalog.len() {
        let result = recommend(&catalog, &corpus, "Heat", k).unwrap();
        assert_eq!(result.len(), k);
    }
}

#[test]
fn test_never_recommends_seed() {
    let catalog = film_catalog();
    let corpus = FeatureCorpus::from_catalog(&catalog);
    let k = catalog.len() - 1;

    for item in catalog.items() {
        let result = recommend(&catalog, &corpus, &item.title, k).unwrap();
        assert!(!result.contains(&item.title), "{} recommended itself", item.title);
    }
}

#[test]
fn test_deterministic() {
    let catalog = film_catalog();
    let corpus = FeatureCorpus::from_catalog(&catalog);

    for item in catalog.items() {
        let first = recommend(&catalog, &corpus, &item.title, 4).unwrap();
        let second = recommend(&catalog, &corpus, &item.title, 4).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_ordered_by_similarity() {
    let catalog = film_catalog();
    let corpus = FeatureCorpus::from_catalog(&catalog);

    let result = recommend_neighbors(&catalog, &corpus, "Heat", 6).unwrap();
    assert!(result.windows(2).all(|w| w[0].distance <= w[1].distance));

    // Shares director, cast or heist keywords with Heat
    let top: Vec<&str> = result.iter().take(3).map(|r| r.title.as_str()).collect();
    assert!(top.contains(&"Collateral"));
    assert!(top.contains(&"Ronin"));
    assert!(top.contains(&"The Insider"));
}

#[test]
fn test_ties_broken_by_index() {
    // Beta and Delta have identical blobs, hence identical distance to Alpha
    let catalog = load_and_normalize(vec![
        movie("Alpha", "2001", "spy action"),
        movie("Beta", "2002", "spy"),
        movie("Gamma", "2003", "cooking"),
        movie("Delta", "2004", "spy"),
    ])
    .unwrap();
    let corpus = FeatureCorpus::from_catalog(&catalog);

    for _ in 0..10 {
        let result = recommend(&catalog, &corpus, "Alpha", 3).unwrap();
        assert_eq!(result, vec!["Beta", "Delta", "Gamma"]);
    }
}

#[test]
fn test_blank_items_rank_last() {
    let catalog = film_catalog();
    let corpus = FeatureCorpus::from_catalog(&catalog);

    let result = recommend_neighbors(&catalog, &corpus, "Chef", catalog.len() - 1).unwrap();
    let last = result.last().unwrap();
    assert_eq!(last.title, "Untitled");
    assert_eq!(last.distance, 1.0);
    assert!(result.iter().all(|r| !r.distance.is_nan()));

    // A blank seed is equally far from everything: plain index order
    let result = recommend(&catalog, &corpus, "Untitled", 3).unwrap();
    assert_eq!(result, vec!["Heat", "Collateral", "Ronin"]);
}

#[test]
fn test_duplicate_titles_resolve_separately() {
    let catalog = load_and_normalize(vec![
        movie("X", "2001", "space opera"),
        movie("Y", "2005", "space station"),
        movie("X", "2010", "cooking show"),
        movie("Z", "2012", "cooking contest"),
    ])
    .unwrap();
    let corpus = FeatureCorpus::from_catalog(&catalog);

    assert_eq!(resolve_title(&catalog, "X (2001)"), Ok(0));
    assert_eq!(resolve_title(&catalog, "X (2010)"), Ok(2));
    assert!(resolve_title(&catalog, "X").is_err());

    assert_eq!(recommend(&catalog, &corpus, "X (2001)", 1).unwrap(), vec!["Y"]);
    assert_eq!(recommend(&catalog, &corpus, "X (2010)", 1).unwrap(), vec!["Z"]);
}

#[test]
fn test_precomputed_index_matches_fresh_vectorization() {
    let catalog = film_catalog();
    let corpus = FeatureCorpus::from_catalog(&catalog);
    let index = FeatureIndex::build(&catalog);
    let cache = IndexCache::new();

    for item in catalog.items() {
        for k in [1, 3, catalog.len() - 1] {
            let fresh = recommend(&catalog, &corpus, &item.title, k).unwrap();
            let precomputed = recommend_with_index(&index, &catalog, &item.title, k).unwrap();
            let cached =
                recommend_with_index(&cache.get_or_build(&catalog), &catalog, &item.title, k)
                    .unwrap();
            assert_eq!(fresh, precomputed);
            assert_eq!(fresh, cached);
        }
    }
    assert_eq!(cache.build_count(), 1);
}

#[test]
fn test_concurrent_queries_share_one_index() {
    let catalog = film_catalog();
    let cache = IndexCache::new();
    let expected = {
        let corpus = FeatureCorpus::from_catalog(&catalog);
        recommend(&catalog, &corpus, "Heat", 3).unwrap()
    };

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let index = cache.get_or_build(&catalog);
                    recommend_with_index(&index, &catalog, "Heat", 3).unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
    assert_eq!(cache.build_count(), 1);
}
