// demos/basic_workflow.rs
//
// Plays both sides of a TON Connect login: the wallet (holding an Ed25519 key
// and its StateInit) and the server (issuing a challenge, verifying the
// proof, handing out a JWT).

use base64::prelude::*;
use ed25519_dalek::{Signer, SigningKey};
use secrecy::Secret;
use ton_proof_jwt::{
    crypto::signature::proof_digest, Address, AuthConfig, AuthRequest, AuthService, JwtConfig,
    ProofConfig, ProofDomain, TonProof,
};
use tracing_subscriber::EnvFilter;

const DOMAIN: &str = "example.com";

/// Serialize a minimal wallet `StateInit`: a root with code and data
/// references, the data cell holding a seqno and the public key.
fn wallet_state_init(public_key: &[u8; 32]) -> Vec<u8> {
    // root: bits 00110 + completion tag, refs -> 1 (code), 2 (data)
    let root = [0x02, 0x01, 0x34, 0x01, 0x02];
    // code: one byte
    let code = [0x00, 0x02, 0xff];
    // data: 32-bit seqno followed by the key
    let mut data = vec![0x00, 0x48, 0x00, 0x00, 0x00, 0x00];
    data.extend_from_slice(public_key);

    let cells_size = (root.len() + code.len() + data.len()) as u8;
    let mut boc = vec![0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 3, 1, 0, cells_size, 0];
    boc.extend_from_slice(&root);
    boc.extend_from_slice(&code);
    boc.extend_from_slice(&data);
    boc
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("TON proof + JWT basic workflow");

    // 1. Setup authentication service
    let config = AuthConfig {
        jwt: JwtConfig {
            secret: Secret::new(BASE64_STANDARD.encode("example-secret-key")),
            ttl: 3600, // 1 hour
        },
        proof: ProofConfig::new(DOMAIN),
    };
    let auth_service = AuthService::new(config);

    // 2. Server issues a challenge
    let challenge = auth_service.generate_challenge()?;
    println!("Generated challenge: {}", challenge);

    // 3. Wallet side: key, StateInit and an address
    let key = SigningKey::from_bytes(&[0x42; 32]);
    let state_init = wallet_state_init(&key.verifying_key().to_bytes());
    let address = Address::new(0, [0x24; 32]);
    println!("Wallet address: {}", address.to_friendly(true, false));

    // 4. Wallet signs the proof
    let mut proof = TonProof {
        timestamp: chrono::Utc::now().timestamp(),
        domain: ProofDomain::new(DOMAIN),
        payload: challenge,
        signature: String::new(),
    };
    let message = ton_proof_jwt::build_message(&address, &proof)?;
    proof.signature = BASE64_STANDARD.encode(key.sign(&proof_digest(&message)).to_bytes());

    let auth_request = AuthRequest {
        address: address.to_friendly(true, false),
        proof,
        state_init: BASE64_STANDARD.encode(&state_init),
        external_id: Some("example-user".to_string()),
    };

    // 5. Server verifies and issues a session
    println!("\nAuthentication attempt...");
    let response = auth_service.authenticate(auth_request.clone())?;
    println!("Authentication successful!");
    println!("   JWT Token: {}", response.session_token);
    println!("   Session ID: {}", response.session_id);
    println!("   Expires at: {}", response.expires_at);

    // 6. The same proof cannot be replayed
    match auth_service.authenticate(auth_request) {
        Ok(_) => println!("Replay unexpectedly accepted"),
        Err(e) => println!("Replay rejected: {}", e),
    }

    // 7. Session validation
    let claims = auth_service.validate_session(&response.session_token)?;
    println!("\nToken validation successful!");
    println!("Address: {}", claims.sub);
    println!("External id: {:?}", claims.ext);
    println!("Expires at: {}", claims.exp);

    Ok(())
}
