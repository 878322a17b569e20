/// Render the public-read bucket policy for a physical bucket name.
///
/// Grants anonymous `s3:GetObject` on every key in the bucket, which is what
/// lets attachment and static URLs be served without signing.
pub(crate) fn public_read_policy(bucket: &str) -> String {
    serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Sid": "allpublic",
                "Effect": "Allow",
                "Principal": { "AWS": "*" },
                "Action": "s3:GetObject",
                "Resource": format!("arn:aws:s3:::{bucket}/*")
            }
        ]
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_targets_the_bucket_arn() {
        let policy = public_read_policy("t1-attachments");
        let parsed: serde_json::Value = serde_json::from_str(&policy).unwrap();
        assert_eq!(parsed["Version"], "2012-10-17");
        assert_eq!(
            parsed["Statement"][0]["Resource"],
            "arn:aws:s3:::t1-attachments/*"
        );
        assert_eq!(parsed["Statement"][0]["Action"], "s3:GetObject");
        assert_eq!(parsed["Statement"][0]["Principal"]["AWS"], "*");
    }
}
