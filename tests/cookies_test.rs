use consentnet::cookies::access::{DirectCookieAccess, DEFAULT_ERASE_PATHS};
use consentnet::cookies::eraser::CookieEraser;
use consentnet::cookies::jar::DocumentCookieJar;
use std::sync::Arc;

fn jar(location: &str) -> Arc<DocumentCookieJar> {
    Arc::new(DocumentCookieJar::for_location(location).unwrap())
}

#[test]
fn test_write_and_read() {
    let jar = jar("https://example.com/s/home");
    jar.write("foo=bar; Path=/").unwrap();
    jar.write("baz=qux; Path=/s").unwrap();

    assert_eq!(jar.get("foo").as_deref(), Some("bar"));
    // Longest path first.
    assert_eq!(jar.read_all(), "baz=qux; foo=bar");
}

#[test]
fn test_path_matching() {
    let jar = jar("https://example.com/foo/bar");
    jar.write("root=val; Path=/").unwrap();
    jar.write("foo=val; Path=/foo").unwrap();
    jar.write("baz=val; Path=/baz").unwrap();

    let names: Vec<_> = jar.visible_cookies().into_iter().map(|c| c.name).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"root".to_string()));
    assert!(names.contains(&"foo".to_string()));
}

#[test]
fn test_secure_cookie_hidden_on_http() {
    let jar = jar("http://example.com/");
    jar.write("token=1; Path=/; Secure").unwrap();
    assert_eq!(jar.get("token"), None);
    assert_eq!(jar.cookie_count(), 1);
}

#[test]
fn test_erase_two_names_is_four_mutations() {
    let jar = jar("https://example.com/s/");
    jar.write("a=1; Path=/").unwrap();
    jar.write("b=2; Path=/s").unwrap();
    let eraser = CookieEraser::new(Arc::new(DirectCookieAccess::new(jar.clone())));
    let names = vec!["a".to_string(), "b".to_string()];

    let before = jar.write_count();
    assert_eq!(eraser.erase(&names).unwrap(), 4);
    assert_eq!(jar.write_count() - before, 4);
    assert_eq!(jar.cookie_count(), 0);

    // Same mutations again, no error.
    assert_eq!(eraser.erase(&names).unwrap(), 4);
    assert_eq!(jar.write_count() - before, 8);
}

#[test]
fn test_custom_erase_paths() {
    let jar = jar("https://example.com/portal/");
    jar.write("a=1; Path=/portal").unwrap();
    let access = DirectCookieAccess::with_paths(
        jar.clone(),
        DEFAULT_ERASE_PATHS
            .iter()
            .map(|p| p.to_string())
            .chain(["/portal".to_string()]),
    );
    let eraser = CookieEraser::new(Arc::new(access));

    assert_eq!(eraser.erase(&["a".to_string()]).unwrap(), 3);
    assert!(!jar.contains("a", "/portal"));
}
