use once_cell::sync::Lazy;

use criterion::{criterion_group, criterion_main, Criterion};

use ftpgate::{verify_password, HashAlgorithm, PasswordConfig, PasswordHasher};

const PASSWORD: &str = "very_secure_password";

static ARGON2: Lazy<PasswordHasher> = Lazy::new(|| hasher(HashAlgorithm::Argon2id));
static BCRYPT: Lazy<PasswordHasher> = Lazy::new(|| hasher(HashAlgorithm::Bcrypt));

// Подготовим заранее сгенерированные хеши
static ARGON2_HASH: Lazy<String> =
    Lazy::new(|| ARGON2.hash(PASSWORD).expect("Failed to hash password"));
static BCRYPT_HASH: Lazy<String> =
    Lazy::new(|| BCRYPT.hash(PASSWORD).expect("Failed to hash password"));

fn hasher(algorithm: HashAlgorithm) -> PasswordHasher {
    PasswordHasher::new(&PasswordConfig {
        algorithm,
        ..PasswordConfig::default()
    })
    .expect("default parameters are valid")
}

fn bench_hash_password(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_password");
    group.sample_size(10);

    group.bench_function("argon2id (default params)", |b| {
        b.iter(|| ARGON2.hash(PASSWORD).unwrap())
    });
    group.bench_function("bcrypt (default cost)", |b| {
        b.iter(|| BCRYPT.hash(PASSWORD).unwrap())
    });

    group.finish();
}

fn bench_verify_password(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify_password");
    group.sample_size(10);

    group.bench_function("argon2id (correct password)", |b| {
        b.iter(|| assert!(verify_password(&ARGON2_HASH, PASSWORD).unwrap()))
    });
    group.bench_function("argon2id (wrong password)", |b| {
        b.iter(|| assert!(!verify_password(&ARGON2_HASH, "wrong_password").unwrap()))
    });
    group.bench_function("bcrypt (correct password)", |b| {
        b.iter(|| assert!(verify_password(&BCRYPT_HASH, PASSWORD).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_hash_password, bench_verify_password);
criterion_main!(benches);
