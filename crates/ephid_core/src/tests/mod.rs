

use fixtures::{SHARED_ROOT, SHARELINK_ROOT, SITE_GID, SITE_UID, Site, USER_ROOT};
use tower::{Service, ServiceExt};

use crate::{
    config::ResolverConfig,
    resolution::{
        api::ResolveRequest,
        error::{ConfigError, ResolutionError},
        init_resolver,
        services::synthesizer::IdentityPolicy,
    },
};

#[tokio::test]
async fn integration_init_resolver() {
    #[cfg(feature = "ephid_tracing")]
    crate::ephid_tracing::init();
    let site = Site::new();
    let mut resolver = init_resolver(site.config()).unwrap();
    let home = site.add_dir(SHARELINK_ROOT, "Ab3kLp9Qz1");

    let identity = assert_identity!(resolver, "Ab3kLp9Qz1", "sharelink", home);
    assert_eq!(identity.uid, SITE_UID);
    assert_eq!(identity.gid, SITE_GID);
    assert_eq!(identity.shell, std::path::PathBuf::from("/usr/sbin/nologin"));
    assert_eq!(
        identity.to_string(),
        format!("Ab3kLp9Qz1:x:1001:1001:sharelink:{}:/usr/sbin/nologin", home.display())
    );
}

#[tokio::test]
async fn integration_structurally_invalid_is_not_found() {
    #[cfg(feature = "ephid_tracing")]
    crate::ephid_tracing::init();
    let site = Site::new();
    let mut resolver = init_resolver(site.config()).unwrap();

    assert_not_found!(resolver, "");
    assert_not_found!(resolver, "short");
    assert_not_found!(resolver, "../../etc");
    assert_not_found!(resolver, "-rf");
    assert_not_found!(resolver, "a".repeat(200));
    assert_not_found!(resolver, "name with spaces");
}

#[cfg(unix)]
#[tokio::test]
async fn integration_broken_root_is_unexpected() {
    #[cfg(feature = "ephid_tracing")]
    crate::ephid_tracing::init();
    let site = Site::new();
    let mut resolver = init_resolver(site.config()).unwrap();
    let root = site.break_root(SHARELINK_ROOT);

    let result = resolver
        .ready()
        .await
        .unwrap()
        .call(ResolveRequest::ByName("Ab3kLp9Qz1".to_string()))
        .await;
    assert!(matches!(
        result,
        Err(ResolutionError::Unexpected(path, _)) if path == root.join("Ab3kLp9Qz1")
    ));

    // Names that fail every structural check never reach the broken root
    assert_not_found!(resolver, "short!");
    assert_not_found!(resolver, "../../etc");
    assert_not_found!(resolver, "");
}

#[tokio::test]
async fn integration_unknown_identifier_is_not_found() {
    #[cfg(feature = "ephid_tracing")]
    crate::ephid_tracing::init();
    let site = Site::new();
    let mut resolver = init_resolver(site.config()).unwrap();
    site.add_dir(SHARELINK_ROOT, "Ab3kLp9Qz1");

    // Well-formed but no backing entry: same answer as a malformed name
    assert_not_found!(resolver, "Zz9kLp9Qz1");
    assert_not_found!(resolver, "alice");
}

#[tokio::test]
async fn integration_removal_takes_effect_immediately() {
    #[cfg(feature = "ephid_tracing")]
    crate::ephid_tracing::init();
    let site = Site::new();
    let mut resolver = init_resolver(site.config()).unwrap();
    let home = site.add_dir(SHARELINK_ROOT, "Ab3kLp9Qz1");

    assert_identity!(resolver, "Ab3kLp9Qz1", "sharelink", home);
    site.remove(&home);
    assert_not_found!(resolver, "Ab3kLp9Qz1");
    site.add_dir(SHARELINK_ROOT, "Ab3kLp9Qz1");
    assert_identity!(resolver, "Ab3kLp9Qz1", "sharelink", home);
}

#[tokio::test]
async fn integration_resolution_is_deterministic() {
    #[cfg(feature = "ephid_tracing")]
    crate::ephid_tracing::init();
    let site = Site::new();
    let mut resolver = init_resolver(site.config_with_shared()).unwrap();
    let home = site.add_dir(USER_ROOT, "alice");

    let first = assert_identity!(resolver, "alice", "user", home);
    let second = assert_identity!(resolver, "alice", "user", home);
    assert_eq!(first, second);
}

#[tokio::test]
async fn integration_encoded_sub_path() {
    #[cfg(feature = "ephid_tracing")]
    crate::ephid_tracing::init();
    let site = Site::new();
    let mut resolver = init_resolver(site.config_with_shared()).unwrap();
    let home = site.add_dir(SHARED_ROOT, "alice/share1");

    // "gdp-" followed by "alice/share1" in unpadded URL-safe base64
    let identity = assert_identity!(resolver, "gdp-YWxpY2Uvc2hhcmUx", "shared", home);
    assert!((200_000..300_000).contains(&identity.uid));
    assert_eq!(identity.gid, SITE_GID);
    assert_eq!(identity.shell, std::path::PathBuf::from("/bin/false"));

    // Padded spelling of the same payload decodes to the same entry
    assert_identity!(resolver, "gdp-YWxpY2Uvc2hhcmUx==", "shared", home);

    // "../etc" never escapes the namespace root
    assert_not_found!(resolver, "gdp-Li4vZXRj");
}

#[tokio::test]
async fn integration_encoded_prefix_falls_back_to_users() {
    #[cfg(feature = "ephid_tracing")]
    crate::ephid_tracing::init();
    let site = Site::new();
    let mut resolver = init_resolver(site.config_with_shared()).unwrap();

    // Matches both namespaces structurally, only the user entry exists
    let home = site.add_dir(USER_ROOT, "gdp-YWxpY2Uvc2hhcmUx");
    assert_identity!(resolver, "gdp-YWxpY2Uvc2hhcmUx", "user", home);
}

#[tokio::test]
async fn integration_classify() {
    #[cfg(feature = "ephid_tracing")]
    crate::ephid_tracing::init();
    let site = Site::new();
    let mut resolver = init_resolver(site.config_with_shared()).unwrap();

    assert_namespace!(resolver, "Ab3kLp9Qz1", Some("sharelink"));
    assert_namespace!(resolver, "alice", Some("user"));
    assert_namespace!(resolver, "gdp-YWxpY2Uvc2hhcmUx", Some("shared"));
    assert_namespace!(resolver, "0123456789abcdef".repeat(4), Some("jobsidmount"));
    assert_namespace!(resolver, "../etc", None);
    assert_namespace!(resolver, "", None);
}

#[tokio::test]
async fn integration_concurrent_lookups() {
    #[cfg(feature = "ephid_tracing")]
    crate::ephid_tracing::init();
    let site = Site::new();
    let resolver = init_resolver(site.config()).unwrap();
    let home = site.add_dir(SHARELINK_ROOT, "Ab3kLp9Qz1");

    let lookups: Vec<_> = (0..32)
        .map(|i| {
            let mut resolver = resolver.clone();
            let name = if i % 2 == 0 { "Ab3kLp9Qz1" } else { "Zz9kLp9Qz1" };
            tokio::spawn(async move { (i, resolve!(resolver, name)) })
        })
        .collect();

    for lookup in lookups {
        let (i, response) = lookup.await.unwrap();
        match response {
            crate::resolution::api::ResolveResponse::Identity(identity) => {
                assert_eq!(i % 2, 0);
                assert_eq!(identity.home, home);
            }
            crate::resolution::api::ResolveResponse::NotFound => assert_eq!(i % 2, 1),
            response => panic!("Unexpected response {response:?}"),
        }
    }
}

#[tokio::test]
async fn integration_invalid_configuration_is_fatal() {
    #[cfg(feature = "ephid_tracing")]
    crate::ephid_tracing::init();
    let site = Site::new();

    let mut config = site.config();
    config.namespaces[2].identity = IdentityPolicy::Fixed { uid: 0, gid: 0 };
    assert_eq!(init_resolver(config).unwrap_err(), ConfigError::PrivilegedId("sharelink".to_string()));

    let config = ResolverConfig::site_defaults(site.path().join("missing"), SITE_UID, SITE_GID);
    assert!(matches!(
        init_resolver(config).unwrap_err(),
        ConfigError::UnreadableBackingRoot(name, _, std::io::ErrorKind::NotFound)
            if name == "jobsidmount"
    ));

    let config = ResolverConfig::from_json(r#"{"priority": [], "namespaces": []}"#).unwrap();
    assert_eq!(init_resolver(config).unwrap_err(), ConfigError::NoNamespaces);
}
